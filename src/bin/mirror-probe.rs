// Smoke-check a running mirror server
//
// Usage: MIRROR_BASE_URL=http://127.0.0.1:3000 mirror-probe

use std::process::ExitCode;

use mirror_lab::probe::{self, ProbeClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Fail before any network traffic when the target is not configured
    let base_url = match probe::require_env(probe::BASE_URL_VAR) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match ProbeClient::new(&base_url) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("[PROBE] Checking {}", client.base_url());
    let outcomes = probe::run_smoke_checks(&client).await;

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(detail) => println!("  ok    {:<18} {detail}", outcome.name),
            Err(e) => {
                failed += 1;
                println!("  FAIL  {:<18} {e}", outcome.name);
            }
        }
    }

    println!(
        "[PROBE] {} passed, {failed} failed",
        outcomes.len() - failed
    );
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
