/// Skip a test if AWS credentials are not configured.
#[macro_export]
macro_rules! skip_without_aws {
    () => {
        if std::env::var("AWS_ACCESS_KEY_ID").is_err() {
            eprintln!("SKIPPED: AWS_ACCESS_KEY_ID not set");
            return;
        }
        if std::env::var("ENVSEC_TEST_REGION").is_err() {
            eprintln!("SKIPPED: ENVSEC_TEST_REGION not set (region with Parameter Store access)");
            return;
        }
    };
}
