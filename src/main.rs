#[tokio::main]
async fn main() {
    classroom_backend::run().await;
}
