use std::io::{Read, Seek};

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use csv::{StringRecord, Trim};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{NewProduct, UpdateProduct};

/// Result type returned by the product form helpers.
pub type ProductFormResult<T> = Result<T, ProductFormError>;

/// A single violated precondition on a submitted product field.
///
/// The serialized form and [`ProductInputError::code`] are stable identifiers
/// meant for lookups in message tables; `Display` gives the default English text.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductInputError {
    #[error("Please enter a name")]
    MissingName,
    #[error("Please enter a price")]
    MissingPrice,
    #[error("The value entered for the price must be a number")]
    PriceNotANumber,
    #[error("The price must be greater than zero")]
    PriceNotGreaterThanZero,
    #[error("Please enter a stock value")]
    MissingQuantity,
    #[error("The value entered for the stock must be an integer")]
    QuantityNotAnInteger,
    #[error("The stock must be greater than zero")]
    QuantityNotGreaterThanZero,
}

impl ProductInputError {
    /// Stable identifier of the error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingName => "MissingName",
            Self::MissingPrice => "MissingPrice",
            Self::PriceNotANumber => "PriceNotANumber",
            Self::PriceNotGreaterThanZero => "PriceNotGreaterThanZero",
            Self::MissingQuantity => "MissingQuantity",
            Self::QuantityNotAnInteger => "QuantityNotAnInteger",
            Self::QuantityNotGreaterThanZero => "QuantityNotGreaterThanZero",
        }
    }
}

/// Errors that can occur while processing product forms.
#[derive(Debug, Error)]
pub enum ProductFormError {
    /// The submitted product failed one or more field checks.
    #[error("{}", join_messages(.0))]
    Invalid(Vec<ProductInputError>),
    /// A CSV row failed one or more field checks.
    #[error("row {row}: {}", join_messages(.errors))]
    InvalidRow {
        row: usize,
        errors: Vec<ProductInputError>,
    },
    /// The uploaded CSV is missing required columns.
    #[error("upload is missing the required `name`, `price` or `quantity` headers")]
    MissingRequiredHeaders,
    /// The uploaded CSV did not contain any products.
    #[error("upload contains no products")]
    EmptyUpload,
    #[error("error reading uploaded file")]
    FileRead(#[from] std::io::Error),
    /// CSV parsing failures.
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

fn join_messages(errors: &[ProductInputError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Product fields as submitted from the admin form.
///
/// Every value arrives as text; fields absent from the submission are empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    pub price: String,
    pub quantity: String,
    pub description: Option<String>,
}

impl ProductForm {
    /// Checks name, price and quantity, returning every failure in a fixed order.
    ///
    /// All checks run. A price (quantity) that does not parse is not also
    /// reported as non-positive. The description is never checked.
    pub fn check_errors(&self) -> Vec<ProductInputError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ProductInputError::MissingName);
        }

        if self.price.trim().is_empty() {
            errors.push(ProductInputError::MissingPrice);
        } else {
            match parse_price(&self.price) {
                None => errors.push(ProductInputError::PriceNotANumber),
                Some(value) if value <= 0.0 => {
                    errors.push(ProductInputError::PriceNotGreaterThanZero)
                }
                Some(_) => {}
            }
        }

        if self.quantity.trim().is_empty() {
            errors.push(ProductInputError::MissingQuantity);
        } else {
            match parse_quantity(&self.quantity) {
                None => errors.push(ProductInputError::QuantityNotAnInteger),
                Some(value) if value <= 0 => {
                    errors.push(ProductInputError::QuantityNotGreaterThanZero)
                }
                Some(_) => {}
            }
        }

        errors
    }

    /// Validates and sanitizes the payload into a domain `NewProduct`.
    pub fn into_new_product(self) -> ProductFormResult<NewProduct> {
        let fields = self.into_valid_fields()?;

        let mut new_product = NewProduct::new(fields.name, fields.price_cents, fields.quantity);
        if let Some(description) = fields.description {
            new_product = new_product.with_description(description);
        }

        Ok(new_product)
    }

    /// Validates and sanitizes the payload into a domain `UpdateProduct`.
    pub fn into_update_product(self) -> ProductFormResult<UpdateProduct> {
        let fields = self.into_valid_fields()?;

        Ok(UpdateProduct::new(
            fields.name,
            fields.description,
            fields.price_cents,
            fields.quantity,
        ))
    }

    fn into_valid_fields(self) -> ProductFormResult<ValidFields> {
        let errors = self.check_errors();
        if !errors.is_empty() {
            return Err(ProductFormError::Invalid(errors));
        }
        Ok(ValidFields::from_checked(&self))
    }
}

/// Field values of a form that passed [`ProductForm::check_errors`].
struct ValidFields {
    name: String,
    description: Option<String>,
    price_cents: i64,
    quantity: i32,
}

impl ValidFields {
    fn from_checked(form: &ProductForm) -> Self {
        // Both values parsed during the check; fall back to the smallest
        // accepted amounts rather than panic.
        let price = parse_price(&form.price).unwrap_or_default();
        let quantity = parse_quantity(&form.quantity).unwrap_or(1);

        Self {
            name: sanitize_inline_text(&form.name),
            description: form
                .description
                .as_deref()
                .map(sanitize_multiline_text)
                .filter(|value| !value.is_empty()),
            price_cents: price_to_cents(price),
            quantity,
        }
    }
}

#[derive(MultipartForm)]
/// Multipart form for uploading a CSV file with new products.
pub struct UploadProductsForm {
    #[multipart(limit = "10MB")]
    /// Uploaded CSV file with `name`, `price`, `quantity` and optional `description` columns.
    pub csv: TempFile,
}

impl UploadProductsForm {
    /// Parse the uploaded CSV file into a list of [`NewProduct`] records.
    pub fn parse(&mut self) -> ProductFormResult<Vec<NewProduct>> {
        self.csv.file.rewind()?;
        parse_products(self.csv.file.by_ref())
    }
}

struct ProductHeaderIndexes {
    name: usize,
    price: usize,
    quantity: usize,
    description: Option<usize>,
}

fn locate_header(headers: &StringRecord, expected: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(expected))
}

fn locate_product_headers(headers: &StringRecord) -> ProductFormResult<ProductHeaderIndexes> {
    match (
        locate_header(headers, "name"),
        locate_header(headers, "price"),
        locate_header(headers, "quantity"),
    ) {
        (Some(name), Some(price), Some(quantity)) => Ok(ProductHeaderIndexes {
            name,
            price,
            quantity,
            description: locate_header(headers, "description"),
        }),
        _ => Err(ProductFormError::MissingRequiredHeaders),
    }
}

fn parse_products<R: Read>(reader: R) -> ProductFormResult<Vec<NewProduct>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let indexes = locate_product_headers(&headers)?;

    let mut products = Vec::new();

    for (index, row) in csv_reader.records().enumerate() {
        let row_number = index + 2; // account for header row
        let record = row?;
        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();

        let form = ProductForm {
            name: field(indexes.name),
            price: field(indexes.price),
            quantity: field(indexes.quantity),
            description: indexes.description.map(field),
        };

        let product = form.into_new_product().map_err(|err| match err {
            ProductFormError::Invalid(errors) => ProductFormError::InvalidRow {
                row: row_number,
                errors,
            },
            other => other,
        })?;
        products.push(product);
    }

    if products.is_empty() {
        return Err(ProductFormError::EmptyUpload);
    }

    Ok(products)
}

/// Largest accepted price in the smallest currency unit.
///
/// Keeps `price * i32::MAX` within `i64`, so any line total for one product fits.
const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Parses a price written with `.` as the decimal separator.
///
/// Non-finite values such as `NaN` or `inf` are rejected, as are prices above
/// [`MAX_PRICE_CENTS`].
fn parse_price(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .filter(|value| (value * 100.0).round() <= MAX_PRICE_CENTS as f64)
}

fn parse_quantity(input: &str) -> Option<i32> {
    input.trim().parse::<i32>().ok()
}

/// Converts a positive price to the smallest currency unit, never below one cent.
fn price_to_cents(price: f64) -> i64 {
    ((price * 100.0).round() as i64).max(1)
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if !ch.is_control() {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

fn sanitize_multiline_text(input: &str) -> String {
    let lines: Vec<String> = input.lines().map(sanitize_inline_text).collect();

    let Some(first) = lines.iter().position(|line| !line.is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .unwrap_or(first);

    let mut result: Vec<&str> = Vec::with_capacity(last - first + 1);
    for line in &lines[first..=last] {
        // Collapse runs of blank lines into one.
        if line.is_empty() && result.last().is_some_and(|prev| prev.is_empty()) {
            continue;
        }
        result.push(line);
    }

    result.join("\n")
}
