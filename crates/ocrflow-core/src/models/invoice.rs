//! Invoice record produced from LLM-generated invoice text.
//!
//! Field names on the wire follow the Portuguese e-invoice vocabulary
//! (`numeroFatura`, `taxID`, ...) used by the downstream consumers. Every
//! field is optional and serializes as `null` when the text did not carry it.

use serde::{Deserialize, Serialize};

/// A complete invoice record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Document metadata.
    pub invoice: InvoiceInfo,

    /// Issuer (seller) information.
    pub issuer: Party,

    /// Buyer information.
    pub buyer: Party,

    /// Line items, in the order they appeared.
    #[serde(rename = "lineItems")]
    pub line_items: Vec<LineItem>,

    /// Subtotal before taxes.
    pub subtotal: Option<f64>,
}

/// Invoice document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceInfo {
    #[serde(rename = "numeroFatura")]
    pub invoice_number: Option<String>,

    #[serde(rename = "dataEmissao")]
    pub issue_date: Option<String>,

    #[serde(rename = "dataVencimento")]
    pub due_date: Option<String>,

    #[serde(rename = "tipoDocumento")]
    pub document_type: Option<String>,

    #[serde(rename = "estadoDocumento")]
    pub document_status: Option<String>,

    #[serde(rename = "atcud")]
    pub atcud: Option<String>,

    #[serde(rename = "certificado")]
    pub certificate: Option<String>,

    #[serde(rename = "totalImpostos")]
    pub total_taxes: Option<f64>,

    #[serde(rename = "totalComImpostos")]
    pub total_with_taxes: Option<f64>,

    #[serde(rename = "identificacaoUnica")]
    pub unique_id: Option<String>,

    #[serde(rename = "hash")]
    pub hash: Option<String>,

    /// Fiscal QR-code payload.
    #[serde(rename = "qrCodeFields")]
    pub qr_code: QrCodeFields,
}

/// The 20 fields of the fiscal QR code printed on certified invoices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QrCodeFields {
    #[serde(rename = "A_Issuers_Tax_ID")]
    pub issuer_tax_id: Option<String>,

    #[serde(rename = "B_Buyers_Tax_ID")]
    pub buyer_tax_id: Option<String>,

    #[serde(rename = "C_Buyers_Country")]
    pub buyer_country: Option<String>,

    #[serde(rename = "D_Document_Type")]
    pub document_type: Option<String>,

    #[serde(rename = "E_Document_Status")]
    pub document_status: Option<String>,

    #[serde(rename = "F_Document_Date")]
    pub document_date: Option<String>,

    #[serde(rename = "G_Document_Unique_ID")]
    pub document_unique_id: Option<String>,

    #[serde(rename = "H_ATCUD")]
    pub atcud: Option<String>,

    #[serde(rename = "I1_Tax_Region")]
    pub tax_region: Option<String>,

    #[serde(rename = "I2_Taxable_Amount_Exempt_VAT")]
    pub taxable_exempt: Option<f64>,

    #[serde(rename = "I3_Taxable_Amount_Reduced_VAT")]
    pub taxable_reduced: Option<f64>,

    #[serde(rename = "I4_VAT_Amount_Reduced_Rate")]
    pub vat_reduced: Option<f64>,

    #[serde(rename = "I5_Taxable_Amount_Intermediate_VAT")]
    pub taxable_intermediate: Option<f64>,

    #[serde(rename = "I6_VAT_Amount_Intermediate_Rate")]
    pub vat_intermediate: Option<f64>,

    #[serde(rename = "I7_Taxable_Amount_Standard_VAT")]
    pub taxable_standard: Option<f64>,

    #[serde(rename = "I8_VAT_Amount_Standard_Rate")]
    pub vat_standard: Option<f64>,

    #[serde(rename = "N_Total_Taxes")]
    pub total_taxes: Option<f64>,

    #[serde(rename = "O_Total_With_Taxes")]
    pub total_with_taxes: Option<f64>,

    #[serde(rename = "Q_Hash_Characters")]
    pub hash_characters: Option<String>,

    #[serde(rename = "R_Certificate_Number")]
    pub certificate_number: Option<String>,
}

/// A party (issuer or buyer) on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "taxID")]
    pub tax_id: Option<String>,

    #[serde(rename = "nome")]
    pub name: Option<String>,

    #[serde(rename = "endereco")]
    pub address: Option<String>,

    #[serde(rename = "codigoPostal")]
    pub postal_code: Option<String>,

    #[serde(rename = "pais")]
    pub country: Option<String>,

    #[serde(rename = "telefone")]
    pub phone: Option<String>,

    pub email: Option<String>,
}

impl Party {
    /// Check if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Party::default()
    }
}

/// A single line item on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product/service code.
    #[serde(rename = "codigo")]
    pub code: Option<String>,

    /// Product/service description.
    #[serde(rename = "descricao")]
    pub description: Option<String>,

    #[serde(rename = "quantidade")]
    pub quantity: Option<f64>,

    #[serde(rename = "precoUnitario")]
    pub unit_price: Option<f64>,

    #[serde(rename = "descontoValor")]
    pub discount_value: Option<f64>,

    #[serde(rename = "descontoPercentagem")]
    pub discount_percent: Option<f64>,

    /// VAT rate or amount as printed.
    #[serde(rename = "iva")]
    pub vat: Option<f64>,

    /// Line total.
    pub total: Option<f64>,
}

impl InvoiceRecord {
    /// Check if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        *self == InvoiceRecord::default()
    }
}
