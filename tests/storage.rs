/*!
 * Storage tests entry point
 */

#[path = "storage/transaction_test.rs"]
mod transaction_test;

#[path = "storage/document_test.rs"]
mod document_test;
