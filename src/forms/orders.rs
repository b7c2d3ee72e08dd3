use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Maximum allowed length for the customer name and address fields.
const TEXT_MAX_LEN: u64 = 255;
/// Maximum allowed length for postal codes.
const ZIP_MAX_LEN: u64 = 16;

/// Errors that can occur while processing the checkout form.
#[derive(Debug, Error)]
pub enum CheckoutFormError {
    /// Validation failures from the `validator` crate.
    #[error("please fill in every delivery field")]
    Validation(#[from] ValidationErrors),
    /// A field only contained whitespace.
    #[error("field `{0}` cannot be blank")]
    Blank(&'static str),
}

/// Delivery details entered at checkout.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CheckoutForm {
    #[validate(length(min = 1, max = TEXT_MAX_LEN))]
    pub name: String,
    #[validate(length(min = 1, max = TEXT_MAX_LEN))]
    pub address: String,
    #[validate(length(min = 1, max = TEXT_MAX_LEN))]
    pub city: String,
    #[validate(length(min = 1, max = ZIP_MAX_LEN))]
    pub zip: String,
    #[validate(length(min = 1, max = TEXT_MAX_LEN))]
    pub country: String,
}

/// Checkout details after validation, with surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDetails {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

impl CheckoutForm {
    /// Validate the submitted fields and return trimmed delivery details.
    pub fn into_delivery_details(self) -> Result<DeliveryDetails, CheckoutFormError> {
        self.validate()?;

        let field = |value: String, label: &'static str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(CheckoutFormError::Blank(label))
            } else {
                Ok(trimmed.to_string())
            }
        };

        Ok(DeliveryDetails {
            name: field(self.name, "name")?,
            address: field(self.address, "address")?,
            city: field(self.city, "city")?,
            zip: field(self.zip, "zip")?,
            country: field(self.country, "country")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            name: " Jane Doe ".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            zip: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    #[test]
    fn checkout_form_trims_fields() {
        let details = filled_form()
            .into_delivery_details()
            .expect("expected success");

        assert_eq!(details.name, "Jane Doe");
        assert_eq!(details.country, "US");
    }

    #[test]
    fn checkout_form_rejects_missing_fields() {
        let mut form = filled_form();
        form.city = String::new();

        assert!(matches!(
            form.into_delivery_details(),
            Err(CheckoutFormError::Validation(_))
        ));
    }

    #[test]
    fn checkout_form_rejects_blank_fields() {
        let mut form = filled_form();
        form.address = "   ".to_string();

        assert!(matches!(
            form.into_delivery_details(),
            Err(CheckoutFormError::Blank("address"))
        ));
    }

    #[test]
    fn checkout_form_rejects_long_zip() {
        let mut form = filled_form();
        form.zip = "1".repeat(17);

        assert!(matches!(
            form.into_delivery_details(),
            Err(CheckoutFormError::Validation(_))
        ));
    }
}
