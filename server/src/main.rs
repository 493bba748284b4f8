#[tokio::main]
async fn main() {
    mezban_server::start_server().await;
}
