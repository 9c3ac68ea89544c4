//! In-memory fakes and helpers for tests, exposed with the `test_utils` feature.

pub mod dynamo_test_utils;
pub mod http_test_utils;
pub mod mock_directory;
pub mod mock_mailer;
pub mod mock_record_store;
pub mod test_logging;
