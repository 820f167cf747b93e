#[tokio::main]
async fn main() {
    konnect_backend::run().await;
}
