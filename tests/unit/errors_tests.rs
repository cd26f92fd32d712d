/*!
 * Tests for error types
 */

use better_translator::errors::{AppError, ProviderError, TranslationError};

/// Test status code classification
#[test]
fn test_from_status_withKnownCodes_shouldClassify() {
    assert!(matches!(
        ProviderError::from_status(401, "bad key".to_string()),
        ProviderError::AuthenticationError(_)
    ));
    assert!(matches!(
        ProviderError::from_status(403, "forbidden".to_string()),
        ProviderError::AuthenticationError(_)
    ));
    assert!(matches!(
        ProviderError::from_status(429, "slow down".to_string()),
        ProviderError::RateLimitExceeded(_)
    ));
    assert!(matches!(
        ProviderError::from_status(502, "bad gateway".to_string()),
        ProviderError::ApiError { status_code: 502, .. }
    ));
}

/// Test protocol errors are told apart from transport errors
#[test]
fn test_is_protocol_error_shouldOnlyMatchShapeErrors() {
    assert!(ProviderError::MissingField("result".to_string()).is_protocol_error());
    assert!(ProviderError::ParseError("eof".to_string()).is_protocol_error());
    assert!(!ProviderError::Timeout("slow".to_string()).is_protocol_error());
    assert!(!ProviderError::ConnectionError("refused".to_string()).is_protocol_error());
}

/// Test error messages nest through the layers
#[test]
fn test_error_display_withNestedErrors_shouldIncludeSource() {
    let provider = ProviderError::ApiError {
        status_code: 500,
        message: "upstream down".to_string(),
    };
    let translation = TranslationError::from(provider);
    assert_eq!(
        translation.to_string(),
        "Provider error: API responded with error: 500 - upstream down"
    );

    let app = AppError::from(translation);
    assert!(app.to_string().starts_with("Translation error: Provider error:"));
}

/// Test conversions into the application error
#[test]
fn test_app_error_from_withForeignErrors_shouldMap() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
    assert!(matches!(AppError::from(io), AppError::File(_)));

    let any = anyhow::anyhow!("inner").context("outer");
    match AppError::from(any) {
        AppError::Unknown(message) => assert_eq!(message, "outer: inner"),
        other => panic!("unexpected error: {:?}", other),
    }
}
