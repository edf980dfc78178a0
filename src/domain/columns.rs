// ==========================================
// 销售对账系统 - 源文件列名
// ==========================================
// 依据: 后台导出文件的列头（西班牙语,原样保留）
// ==========================================

/// 销售台账（月度销售导出）
pub mod ledger {
    pub const DOCUMENT_TYPE: &str = "Tipo de Documento";
    pub const DOCUMENT_NUMBER: &str = "Numero Documento";
    pub const SKU: &str = "SKU";
    pub const QUANTITY: &str = "Cantidad";
    pub const GROSS: &str = "Subtotal Bruto";
    pub const TAX: &str = "Subtotal Impuestos";
    pub const BRANCH: &str = "Sucursal";
    pub const PRODUCT_TYPE: &str = "Tipo de Producto / Servicio";
    pub const TOTAL_COST: &str = "Costo Total Neto";
    pub const ISSUE_DATE: &str = "Fecha de Emisión";
    pub const MOVEMENT_TYPE: &str = "Tipo Movimiento";

    // 派生列
    pub const PRODUCT: &str = "Producto";
    pub const UNIT_COST: &str = "Costo Neto Unitario";
    pub const TOTAL_SALE: &str = "Total venta";
    pub const MARKETPLACE: &str = "Marketplace";
}

/// 成本导出
pub mod cost {
    pub const SKU: &str = "SKU";
    pub const NET_COST: &str = "Costo Neto";
}

/// 年度多分段导出
pub mod annual {
    pub const DOCUMENT_TYPE: &str = "Tipo Documento";
    pub const DOCUMENT_NUMBER: &str = "Nº Documento";
    pub const BRANCH: &str = "Sucursal";
    pub const SELLER: &str = "Vendedor";
    pub const CUSTOMER: &str = "Cliente";
    pub const MARKETPLACE: &str = "Marketplace";

    /// 关联单据列按前缀匹配,完整列头带有格式说明括号
    pub const RELATED_DOCUMENTS_PREFIX: &str = "Documentos Relacionados";

    // 第二工作簿中追加的派生列
    pub const RELATED_TYPE: &str = "Tipo_Doc_Relacionado";
    pub const RELATED_NUMBER: &str = "Num_Doc_Relacionado";
}
