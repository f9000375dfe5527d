//! Reference record layouts for the interchange files the codec was built
//! around: an employee roster, a bank transaction extract, and invoices.

use crate::descriptor::ColumnDescriptor;
use crate::schema::{FixedRecord, SchemaBuilder};
use chrono::{NaiveDate, NaiveTime};

/// Employee roster line, 74 characters.
///
/// | Column      | Width | Layout                |
/// |-------------|-------|-----------------------|
/// | employee_id | 10    | zero-filled           |
/// | full_name   | 30    | left-aligned          |
/// | birth_date  | 8     | `yyyyMMdd`            |
/// | salary      | 10    | `0000000.00`, no point|
/// | is_active   | 1     | `Y` / `N`             |
/// | department  | 15    | left-aligned, optional|
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeRecord {
    pub employee_id: i32,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub salary: f64,
    pub is_active: bool,
    pub department: Option<String>,
}

impl FixedRecord for EmployeeRecord {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .column(
                "employee_id",
                |r| &r.employee_id,
                |r| &mut r.employee_id,
                ColumnDescriptor::new(1, 10).pad_left('0'),
            )
            .column(
                "full_name",
                |r| &r.full_name,
                |r| &mut r.full_name,
                ColumnDescriptor::new(2, 30),
            )
            .column(
                "birth_date",
                |r| &r.birth_date,
                |r| &mut r.birth_date,
                ColumnDescriptor::new(3, 8).format("yyyyMMdd"),
            )
            .column(
                "salary",
                |r| &r.salary,
                |r| &mut r.salary,
                ColumnDescriptor::new(4, 10).format("0000000.00"),
            )
            .column(
                "is_active",
                |r| &r.is_active,
                |r| &mut r.is_active,
                ColumnDescriptor::new(5, 1).format("Y"),
            )
            .column(
                "department",
                |r| &r.department,
                |r| &mut r.department,
                ColumnDescriptor::new(6, 15),
            );
    }
}

/// Bank transaction extract line, 112 characters.
///
/// The amount is written in whole currency units with no separator; any
/// fraction is dropped on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: i64,
    pub transaction_date: NaiveDate,
    pub transaction_time: NaiveTime,
    pub amount: f64,
    pub customer_code: String,
    pub description: String,
    pub is_successful: bool,
}

impl FixedRecord for TransactionRecord {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .column(
                "transaction_id",
                |r| &r.transaction_id,
                |r| &mut r.transaction_id,
                ColumnDescriptor::new(1, 15).pad_left('0'),
            )
            .column(
                "transaction_date",
                |r| &r.transaction_date,
                |r| &mut r.transaction_date,
                ColumnDescriptor::new(2, 8).format("yyyyMMdd"),
            )
            .column(
                "transaction_time",
                |r| &r.transaction_time,
                |r| &mut r.transaction_time,
                ColumnDescriptor::new(3, 6).format("HHmmss"),
            )
            .column(
                "amount",
                |r| &r.amount,
                |r| &mut r.amount,
                ColumnDescriptor::new(4, 12).converter_named("whole-units"),
            )
            .column(
                "customer_code",
                |r| &r.customer_code,
                |r| &mut r.customer_code,
                ColumnDescriptor::new(5, 20),
            )
            .column(
                "description",
                |r| &r.description,
                |r| &mut r.description,
                ColumnDescriptor::new(6, 50),
            )
            .column(
                "is_successful",
                |r| &r.is_successful,
                |r| &mut r.is_successful,
                ColumnDescriptor::new(7, 1).format("S"),
            );
    }
}

/// Invoice line, 284 characters.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub invoice_number: i64,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub customer_code: String,
    pub customer_name: String,
    pub sub_total: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub status: String,
    pub is_paid: bool,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl Default for InvoiceRecord {
    fn default() -> Self {
        Self {
            invoice_number: 0,
            invoice_date: NaiveDate::default(),
            due_date: None,
            customer_code: String::new(),
            customer_name: String::new(),
            sub_total: 0.0,
            tax_amount: 0.0,
            total_amount: 0.0,
            status: "PENDING".to_string(),
            is_paid: false,
            reference: None,
            notes: None,
        }
    }
}

const AMOUNT_FORMAT: &str = "000000000000.00";

impl FixedRecord for InvoiceRecord {
    fn describe(schema: &mut SchemaBuilder<Self>) {
        schema
            .column(
                "invoice_number",
                |r| &r.invoice_number,
                |r| &mut r.invoice_number,
                ColumnDescriptor::new(1, 12).pad_left('0'),
            )
            .column(
                "invoice_date",
                |r| &r.invoice_date,
                |r| &mut r.invoice_date,
                ColumnDescriptor::new(2, 8).format("yyyyMMdd"),
            )
            .column(
                "due_date",
                |r| &r.due_date,
                |r| &mut r.due_date,
                ColumnDescriptor::new(3, 8).format("yyyyMMdd"),
            )
            .column(
                "customer_code",
                |r| &r.customer_code,
                |r| &mut r.customer_code,
                ColumnDescriptor::new(4, 20),
            )
            .column(
                "customer_name",
                |r| &r.customer_name,
                |r| &mut r.customer_name,
                ColumnDescriptor::new(5, 50),
            )
            .column(
                "sub_total",
                |r| &r.sub_total,
                |r| &mut r.sub_total,
                ColumnDescriptor::new(6, 15).pad_left('0').format(AMOUNT_FORMAT),
            )
            .column(
                "tax_amount",
                |r| &r.tax_amount,
                |r| &mut r.tax_amount,
                ColumnDescriptor::new(7, 15).pad_left('0').format(AMOUNT_FORMAT),
            )
            .column(
                "total_amount",
                |r| &r.total_amount,
                |r| &mut r.total_amount,
                ColumnDescriptor::new(8, 15).pad_left('0').format(AMOUNT_FORMAT),
            )
            .column(
                "status",
                |r| &r.status,
                |r| &mut r.status,
                ColumnDescriptor::new(9, 10).default_value("PENDING"),
            )
            .column(
                "is_paid",
                |r| &r.is_paid,
                |r| &mut r.is_paid,
                ColumnDescriptor::new(10, 1).format("Y"),
            )
            .column(
                "reference",
                |r| &r.reference,
                |r| &mut r.reference,
                ColumnDescriptor::new(11, 30),
            )
            .column(
                "notes",
                |r| &r.notes,
                |r| &mut r.notes,
                ColumnDescriptor::new(12, 100),
            );
    }
}
