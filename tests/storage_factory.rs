use fmltc_util::error::{AppError, StorageError};
use fmltc_util::storage::client::storage_client;
use fmltc_util::storage::config::KEY_PATH_ENV;
use std::env;
use std::fs;
use tempfile::TempDir;

const KEY_JSON: &str = include_str!("fixtures/service_account.json");
const CLIENT_EMAIL: &str = "trainer@fmltc-test.iam.gserviceaccount.com";

// All cases share one test so the environment variable and the working
// directory are never raced.
#[test]
fn test_storage_client_key_path_resolution() {
    let original_key_path = env::var(KEY_PATH_ENV).ok();
    let original_dir = env::current_dir().expect("current dir");

    // Key file named by the environment variable
    let env_dir = TempDir::new().expect("Failed to create temp directory");
    let key_path = env_dir.path().join("service-account.json");

    unsafe {
        env::set_var(KEY_PATH_ENV, &key_path);
    }
    let result = storage_client();
    assert!(matches!(
        result,
        Err(AppError::Storage(StorageError::FileIo { .. }))
    ));

    fs::write(&key_path, KEY_JSON).expect("write key");
    let client = storage_client().expect("client should build from key file");
    assert_eq!(client.client_email(), CLIENT_EMAIL);

    // Without the variable, key.json in the working directory is used
    let work_dir = TempDir::new().expect("Failed to create temp directory");
    fs::write(work_dir.path().join("key.json"), KEY_JSON).expect("write key");
    unsafe {
        env::remove_var(KEY_PATH_ENV);
    }
    env::set_current_dir(work_dir.path()).expect("enter temp dir");
    let result = storage_client();
    env::set_current_dir(&original_dir).expect("restore working dir");

    let client = result.expect("client should build from key.json");
    assert_eq!(client.client_email(), CLIENT_EMAIL);

    unsafe {
        match original_key_path {
            Some(value) => env::set_var(KEY_PATH_ENV, value),
            None => env::remove_var(KEY_PATH_ENV),
        }
    }
}
