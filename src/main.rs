#[tokio::main]
async fn main() {
    patrimoniu::start_server().await;
}
