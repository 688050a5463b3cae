//! Report assembly: inventory and sales summaries plus CSV rendering.

use crate::models::{Invoice, Material};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One inventory report line.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow {
    pub item_id: String,
    pub item_name: String,
    pub available_qty: i32,
    pub unit_price: Decimal,
    pub preorder_level: i32,
    pub low_stock: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryReport {
    pub rows: Vec<InventoryRow>,
    pub low_stock_count: usize,
}

/// Sales summary for a period: totals over the invoices created in it.
#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub invoice_count: usize,
    pub total_invoiced: Decimal,
    pub total_collected: Decimal,
    pub total_outstanding: Decimal,
    pub rows: Vec<SalesRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesRow {
    pub invoice_id: uuid::Uuid,
    pub created_date: NaiveDate,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: String,
}

pub fn build_inventory_report(materials: &[Material]) -> InventoryReport {
    let rows: Vec<InventoryRow> = materials
        .iter()
        .map(|m| InventoryRow {
            item_id: m.item_id.clone(),
            item_name: m.item_name.clone(),
            available_qty: m.available_qty,
            unit_price: m.unit_price,
            preorder_level: m.preorder_level,
            low_stock: m.is_low_stock(),
        })
        .collect();
    let low_stock_count = rows.iter().filter(|r| r.low_stock).count();
    InventoryReport {
        rows,
        low_stock_count,
    }
}

pub fn build_sales_report(
    invoices: &[Invoice],
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> SalesReport {
    let rows: Vec<SalesRow> = invoices
        .iter()
        .map(|inv| SalesRow {
            invoice_id: inv.invoice_id,
            created_date: inv.created_utc.date_naive(),
            total_amount: inv.total_amount,
            paid_amount: inv.paid_amount,
            payment_status: inv.payment_status.clone(),
        })
        .collect();
    SalesReport {
        start_date,
        end_date,
        invoice_count: rows.len(),
        total_invoiced: invoices.iter().map(|i| i.total_amount).sum(),
        total_collected: invoices.iter().map(|i| i.paid_amount).sum(),
        total_outstanding: invoices
            .iter()
            .map(|i| i.total_amount - i.paid_amount)
            .sum(),
        rows,
    }
}

/// Render the inventory report as CSV. Quotes fields that need it.
pub fn inventory_csv(report: &InventoryReport) -> String {
    let mut out =
        String::from("item_id,item_name,available_qty,unit_price,preorder_level,low_stock\n");
    for row in &report.rows {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(&row.item_id),
            csv_field(&row.item_name),
            row.available_qty,
            row.unit_price,
            row.preorder_level,
            row.low_stock
        ));
    }
    out
}

/// Render the sales report as CSV.
pub fn sales_csv(report: &SalesReport) -> String {
    let mut out =
        String::from("invoice_id,created_date,total_amount,paid_amount,payment_status\n");
    for row in &report.rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            row.invoice_id,
            row.created_date,
            row.total_amount,
            row.paid_amount,
            csv_field(&row.payment_status)
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn material(id: &str, qty: i32, preorder: i32) -> Material {
        Material {
            item_id: id.to_string(),
            item_name: format!("Material {}", id),
            available_qty: qty,
            unit_price: Decimal::new(10_00, 2),
            preorder_level: preorder,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn inventory_report_flags_low_stock() {
        let materials = vec![material("brass", 3, 5), material("resin", 50, 5)];
        let report = build_inventory_report(&materials);
        assert_eq!(report.rows.len(), 2);
        assert!(report.rows[0].low_stock);
        assert!(!report.rows[1].low_stock);
        assert_eq!(report.low_stock_count, 1);
    }

    #[test]
    fn sales_report_sums_totals() {
        let now = Utc::now();
        let invoices = vec![
            Invoice {
                invoice_id: uuid::Uuid::new_v4(),
                quotation_id: uuid::Uuid::new_v4(),
                total_amount: Decimal::new(1000_00, 2),
                paid_amount: Decimal::new(400_00, 2),
                payment_status: "partially_paid".to_string(),
                customer_approval_status: "pending".to_string(),
                created_utc: now,
            },
            Invoice {
                invoice_id: uuid::Uuid::new_v4(),
                quotation_id: uuid::Uuid::new_v4(),
                total_amount: Decimal::new(500_00, 2),
                paid_amount: Decimal::new(500_00, 2),
                payment_status: "completed".to_string(),
                customer_approval_status: "approved".to_string(),
                created_utc: now,
            },
        ];
        let report = build_sales_report(&invoices, None, None);
        assert_eq!(report.invoice_count, 2);
        assert_eq!(report.total_invoiced, Decimal::new(1500_00, 2));
        assert_eq!(report.total_collected, Decimal::new(900_00, 2));
        assert_eq!(report.total_outstanding, Decimal::new(600_00, 2));
    }

    #[test]
    fn empty_period_yields_zero_totals() {
        let report = build_sales_report(&[], None, None);
        assert_eq!(report.invoice_count, 0);
        assert_eq!(report.total_invoiced, Decimal::ZERO);
        assert_eq!(report.total_outstanding, Decimal::ZERO);
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn inventory_csv_has_header_and_rows() {
        let report = build_inventory_report(&[material("brass", 3, 5)]);
        let csv = inventory_csv(&report);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("item_id,item_name,available_qty,unit_price,preorder_level,low_stock")
        );
        assert_eq!(lines.next(), Some("brass,Material brass,3,10.00,5,true"));
    }
}
