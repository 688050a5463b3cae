//! Domain models for order-service.

mod custom_order;
mod invoice;
mod job;
mod line_item;
mod material;
mod payment;
mod quotation;

pub use custom_order::{
    CreateCustomOrder, CustomOrder, DesignFile, ItemType, NewDesignFile, OrderPricing,
    PaymentOption, format_request_id, price_order,
};
pub use invoice::{CreateInvoice, CustomerApproval, Invoice, InvoicePaymentStatus};
pub use job::{Job, JobStatus, UpdateJob};
pub use line_item::{CreateLineItem, InvoiceItem};
pub use material::{
    CreateMachine, CreateMaterial, Machine, MachineStatus, Material, MaterialImage, UpdateMachine,
};
pub use payment::Payment;
pub use quotation::{CreateQuotation, Quotation, QuotationStatus};
