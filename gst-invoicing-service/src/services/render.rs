//! HTML rendering for invoice documents.
//!
//! Amounts are printed exactly as stored on the invoice record. Nothing is
//! recomputed at render time, so the document always matches what was
//! persisted and validated at creation.

use crate::models::{Invoice, InvoiceItem};
use rust_decimal::Decimal;

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn address_block(parts: [&Option<String>; 6]) -> String {
    parts
        .iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.trim().is_empty())
        .map(|part| format!("<div>{}</div>", escape_html(part)))
        .collect::<Vec<_>>()
        .join("\n            ")
}

/// Renders a standalone HTML document for a stored invoice.
pub fn render_invoice_html(invoice: &Invoice, items: &[InvoiceItem]) -> String {
    let item_rows = items
        .iter()
        .map(|item| {
            format!(
                r#"<tr>
                <td>{}</td>
                <td>{}</td>
                <td>{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
                <td class="right">{}</td>
            </tr>"#,
                item.line_no,
                escape_html(&item.description),
                item.hsn_code
                    .as_deref()
                    .map(escape_html)
                    .unwrap_or_else(|| "-".to_string()),
                item.quantity,
                format_amount(item.unit_price),
                format_amount(item.discount),
                format_amount(item.taxable_value),
                format_amount(item.cgst_amount),
                format_amount(item.sgst_amount),
                format_amount(item.igst_amount),
                format_amount(item.cess_amount),
                format_amount(item.total),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let issuer_address = address_block([
        &invoice.issuer_line1,
        &invoice.issuer_line2,
        &invoice.issuer_city,
        &invoice.issuer_state,
        &invoice.issuer_postal_code,
        &invoice.issuer_country,
    ]);
    let customer_address = address_block([
        &invoice.billing_line1,
        &invoice.billing_line2,
        &invoice.billing_city,
        &invoice.billing_state,
        &invoice.billing_postal_code,
        &invoice.billing_country,
    ]);

    let customer_gstin_html = invoice
        .customer_gstin
        .as_deref()
        .filter(|gstin| !gstin.is_empty())
        .map(|gstin| format!("<div>GSTIN: {}</div>", gstin))
        .unwrap_or_else(|| "<div>Unregistered</div>".to_string());

    let customer_contact_html = invoice
        .customer_contact
        .as_deref()
        .filter(|contact| !contact.trim().is_empty())
        .map(|contact| format!("<div>{}</div>", escape_html(contact)))
        .unwrap_or_default();

    let due_date_html = invoice
        .due_date
        .map(|due| {
            format!(
                r#"<div class="invoice-date">Due Date: {}</div>"#,
                due.format("%d %b %Y")
            )
        })
        .unwrap_or_default();

    let payment_reference_html = invoice
        .payment_reference
        .as_deref()
        .map(|reference| {
            format!(
                r#"<div class="invoice-date">Payment Reference: {}</div>"#,
                escape_html(reference)
            )
        })
        .unwrap_or_default();

    let notes_html = invoice
        .notes
        .as_deref()
        .filter(|notes| !notes.trim().is_empty())
        .map(|notes| {
            format!(
                r#"<div class="notes"><strong>Notes:</strong><br>{}</div>"#,
                escape_html(notes)
            )
        })
        .unwrap_or_default();

    let status = invoice.status();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Tax Invoice {}</title>
    <style>
        body {{ font-family: 'Helvetica Neue', Arial, sans-serif; margin: 0; padding: 40px; color: #1f2937; }}
        .header {{ display: flex; justify-content: space-between; margin-bottom: 32px; }}
        .seller {{ font-size: 14px; line-height: 1.6; }}
        .seller-name {{ font-size: 22px; font-weight: bold; margin-bottom: 6px; }}
        .invoice-meta {{ text-align: right; }}
        .doc-title {{ font-size: 14px; letter-spacing: 2px; color: #6b7280; }}
        .invoice-number {{ font-size: 24px; font-weight: bold; color: #1d4ed8; }}
        .invoice-date {{ font-size: 14px; color: #6b7280; margin-top: 6px; }}
        .status {{ display: inline-block; padding: 3px 10px; border-radius: 4px; font-size: 12px; font-weight: bold; text-transform: uppercase; }}
        .status-draft {{ background: #f3f4f6; color: #374151; }}
        .status-pending {{ background: #dbeafe; color: #1e40af; }}
        .status-paid {{ background: #dcfce7; color: #166534; }}
        .status-cancelled {{ background: #fee2e2; color: #991b1b; }}
        .parties {{ display: flex; gap: 24px; margin-bottom: 32px; }}
        .party {{ flex: 1; padding: 16px; background: #f9fafb; border-radius: 8px; font-size: 14px; line-height: 1.6; }}
        .party h3 {{ margin: 0 0 10px 0; font-size: 12px; text-transform: uppercase; color: #6b7280; }}
        .party-name {{ font-size: 16px; font-weight: bold; }}
        table {{ width: 100%; border-collapse: collapse; margin-bottom: 16px; }}
        th {{ background: #f3f4f6; padding: 10px 8px; text-align: left; font-size: 11px; text-transform: uppercase; color: #6b7280; }}
        td {{ padding: 10px 8px; border-bottom: 1px solid #e5e7eb; font-size: 13px; }}
        .right {{ text-align: right; }}
        .totals table {{ width: 320px; margin-left: auto; }}
        .totals td {{ padding: 6px 0; }}
        .totals .total-row {{ font-size: 17px; font-weight: bold; border-top: 2px solid #1f2937; }}
        .notes {{ margin-top: 32px; padding: 16px; background: #fffbeb; border-radius: 8px; font-size: 14px; }}
        .footer {{ margin-top: 40px; padding-top: 16px; border-top: 1px solid #e5e7eb; font-size: 12px; color: #6b7280; text-align: center; }}
    </style>
</head>
<body>
    <div class="header">
        <div class="seller">
            <div class="seller-name">{}</div>
            {}
            <div>GSTIN: {}</div>
        </div>
        <div class="invoice-meta">
            <div class="doc-title">TAX INVOICE</div>
            <div class="invoice-number">{}</div>
            <div class="invoice-date">Date: {}</div>
            {}
            <div style="margin-top: 12px;"><span class="status status-{}">{}</span></div>
            {}
        </div>
    </div>

    <div class="parties">
        <div class="party">
            <h3>Bill To</h3>
            <div class="party-name">{}</div>
            {}
            {}
            {}
        </div>
        <div class="party">
            <h3>Supply</h3>
            <div>Place of Supply: {}</div>
            <div>Reverse Charge: {}</div>
        </div>
    </div>

    <table>
        <thead>
            <tr>
                <th>#</th>
                <th>Description</th>
                <th>HSN/SAC</th>
                <th class="right">Qty</th>
                <th class="right">Unit Price</th>
                <th class="right">Discount</th>
                <th class="right">Taxable Value</th>
                <th class="right">CGST</th>
                <th class="right">SGST</th>
                <th class="right">IGST</th>
                <th class="right">Cess</th>
                <th class="right">Total</th>
            </tr>
        </thead>
        <tbody>
            {}
        </tbody>
    </table>

    <div class="totals">
        <table>
            <tr>
                <td>Taxable Value</td>
                <td class="right">{}</td>
            </tr>
            <tr>
                <td>CGST</td>
                <td class="right">{}</td>
            </tr>
            <tr>
                <td>SGST</td>
                <td class="right">{}</td>
            </tr>
            <tr>
                <td>IGST</td>
                <td class="right">{}</td>
            </tr>
            <tr>
                <td>Cess</td>
                <td class="right">{}</td>
            </tr>
            <tr class="total-row">
                <td>Grand Total</td>
                <td class="right">{}</td>
            </tr>
        </table>
    </div>

    {}

    <div class="footer">This is a computer generated invoice.</div>
</body>
</html>"#,
        invoice.invoice_number,
        escape_html(&invoice.issuer_name),
        issuer_address,
        invoice.issuer_gstin,
        invoice.invoice_number,
        invoice.invoice_date.format("%d %b %Y"),
        due_date_html,
        status.as_str(),
        status.as_str(),
        payment_reference_html,
        escape_html(&invoice.customer_name),
        customer_contact_html,
        customer_address,
        customer_gstin_html,
        invoice.place_of_supply,
        if invoice.reverse_charge { "Yes" } else { "No" },
        item_rows,
        format_amount(invoice.subtotal),
        format_amount(invoice.cgst_total),
        format_amount(invoice.sgst_total),
        format_amount(invoice.igst_total),
        format_amount(invoice.cess_total),
        format_amount(invoice.grand_total),
        notes_html,
    )
}
