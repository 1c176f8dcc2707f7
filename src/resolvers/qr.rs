use image::DynamicImage;
use rxing::BarcodeFormat;

/// Scans a photo bitmap for barcodes and returns the first QR payload.
///
/// The scan is multi-symbology: photos of physical specimens regularly carry
/// EAN or Code-128 stickers next to the QR label, and those must not be
/// mistaken for the payload. Non-QR symbols are ignored entirely.
///
/// Returns `None` when no QR symbol is present or the bitmap is unusable.
/// CPU-bound; callers on an async runtime should wrap this in
/// `spawn_blocking`.
pub fn decode_payload(photo: &DynamicImage) -> Option<String> {
    let luma = photo.to_luma8();
    let (width, height) = luma.dimensions();

    // The detector reports "nothing found" as an error; both that and any
    // real detector failure mean the same thing here: no payload.
    let symbols = match rxing::helpers::detect_multiple_in_luma(luma.into_raw(), width, height) {
        Ok(symbols) => symbols,
        Err(err) => {
            tracing::debug!(%err, "barcode scan produced no usable symbols");
            return None;
        }
    };

    first_qr_payload(
        symbols
            .iter()
            .map(|symbol| (symbol.getBarcodeFormat().clone(), symbol.getText().to_string())),
    )
}

/// Picks the first symbol tagged as QR, ignoring every other symbology.
fn first_qr_payload(symbols: impl IntoIterator<Item = (BarcodeFormat, String)>) -> Option<String> {
    symbols
        .into_iter()
        .find(|(format, _)| *format == BarcodeFormat::QR_CODE)
        .map(|(_, payload)| payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer};

    #[test]
    fn test_qr_symbol_is_picked_over_other_barcode_types() {
        let symbols = vec![
            (BarcodeFormat::EAN_13, "4006381333931".to_string()),
            (BarcodeFormat::QR_CODE, "SPECIMEN-0042".to_string()),
            (BarcodeFormat::CODE_128, "LOT-7".to_string()),
        ];

        assert_eq!(
            first_qr_payload(symbols),
            Some("SPECIMEN-0042".to_string())
        );
    }

    #[test]
    fn test_first_of_multiple_qr_symbols_wins() {
        let symbols = vec![
            (BarcodeFormat::QR_CODE, "first".to_string()),
            (BarcodeFormat::QR_CODE, "second".to_string()),
        ];

        assert_eq!(first_qr_payload(symbols), Some("first".to_string()));
    }

    #[test]
    fn test_no_qr_symbol_yields_none() {
        let symbols = vec![
            (BarcodeFormat::EAN_13, "4006381333931".to_string()),
            (BarcodeFormat::AZTEC, "not a qr".to_string()),
        ];

        assert_eq!(first_qr_payload(symbols), None);
        assert_eq!(first_qr_payload(Vec::new()), None);
    }

    #[test]
    fn test_blank_bitmap_decodes_to_none() {
        let blank = DynamicImage::ImageLuma8(ImageBuffer::new(64, 64));

        assert_eq!(decode_payload(&blank), None);
    }
}
