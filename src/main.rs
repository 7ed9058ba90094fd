use feedback_widget::CliArgs;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is normal outside development.
        if !e.not_found() {
            eprintln!("Failed to read .env: {}", e);
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = feedback_widget::run(args).await {
        eprintln!("Error submitting feedback: {:#}", e);
        std::process::exit(1);
    }
}
