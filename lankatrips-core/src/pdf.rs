//! Receipt PDF rendering.
//!
//! Produces a single A4 page with the receipt header, customer block,
//! booking block and payment block, using the built-in Helvetica fonts so
//! no font assets ship with the binary.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::models::{Booking, Package, Receipt, User};

const LEFT: f32 = 20.0;
const TITLE_SIZE: f32 = 20.0;
const BODY_SIZE: f32 = 12.0;

/// Everything needed to render one receipt. The package is optional
/// because it may have been deleted after the booking was made.
pub struct ReceiptPdf<'a> {
    pub receipt: &'a Receipt,
    pub booking: &'a Booking,
    pub package: Option<&'a Package>,
    pub user: &'a User,
}

struct Page {
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Page {
    fn heading(&mut self, text: &str) {
        self.y -= 8.0;
        self.layer
            .use_text(text, BODY_SIZE, Mm(LEFT), Mm(self.y), &self.bold);
        self.y -= 8.0;
    }

    fn line(&mut self, text: &str) {
        self.layer
            .use_text(text, BODY_SIZE, Mm(LEFT), Mm(self.y), &self.regular);
        self.y -= 8.0;
    }
}

/// Renders the receipt and returns the PDF bytes.
pub fn render_receipt(data: &ReceiptPdf<'_>) -> anyhow::Result<Vec<u8>> {
    let (doc, page_idx, layer_idx) =
        PdfDocument::new("LankaTrips Receipt", Mm(210.0), Mm(297.0), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let mut page = Page {
        layer,
        regular,
        bold,
        y: 270.0,
    };

    page.layer.use_text(
        "LankaTrips Receipt",
        TITLE_SIZE,
        Mm(LEFT),
        Mm(page.y),
        &page.bold,
    );
    page.y -= 12.0;
    page.line(&format!("Receipt No: {}", data.receipt.receipt_no));
    page.line(&format!(
        "Date: {}",
        data.receipt.issued_at.format("%Y-%m-%d")
    ));

    page.heading("Customer Information:");
    page.line(&format!("Name: {}", data.user.name));
    page.line(&format!("Email: {}", data.user.email));

    page.heading("Booking Details:");
    let title = data.package.map(|p| p.title.as_str()).unwrap_or("N/A");
    page.line(&format!("Package: {title}"));
    page.line(&format!(
        "Travel Date: {}",
        data.booking.date.format("%Y-%m-%d")
    ));
    page.line(&format!("Travelers: {}", data.booking.travelers));
    page.line(&format!("Pickup City: {}", data.booking.pickup_city));

    page.heading("Payment Information:");
    page.line(&format!(
        "Amount: {} {:.2}",
        data.receipt.currency, data.receipt.amount
    ));
    page.line(&format!("Payment Method: {}", data.receipt.payment_method));
    page.line(&format!("Status: {}", data.receipt.payment_status));

    let bytes = doc.save_to_bytes()?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::{PaymentStatus, PAYMENT_METHOD_PAY_LATER};
    use crate::models::{BookingStatus, Role};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn sample() -> (Receipt, Booking, User) {
        let now = Utc::now();
        let booking_id = Uuid::new_v4();
        let receipt = Receipt {
            id: Uuid::new_v4(),
            booking_ref: booking_id,
            receipt_no: "LT-123456-ABC123".to_string(),
            amount: Decimal::new(300000, 2),
            currency: "LKR".to_string(),
            payment_method: PAYMENT_METHOD_PAY_LATER.to_string(),
            payment_status: PaymentStatus::Unpaid,
            issued_at: now,
            created_at: now,
            updated_at: now,
        };
        let booking = Booking {
            id: booking_id,
            user_ref: Uuid::new_v4(),
            package_ref: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
            travelers: 3,
            pickup_city: "Colombo".to_string(),
            phone: "+94771234567".to_string(),
            total_price: Decimal::new(300000, 2),
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let user = User {
            id: booking.user_ref,
            name: "Amal Perera".to_string(),
            email: "amal@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Customer,
            created_at: now,
            updated_at: now,
        };
        (receipt, booking, user)
    }

    #[test]
    fn renders_a_pdf_document_without_package() {
        let (receipt, booking, user) = sample();
        let bytes = render_receipt(&ReceiptPdf {
            receipt: &receipt,
            booking: &booking,
            package: None,
            user: &user,
        })
        .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }
}
