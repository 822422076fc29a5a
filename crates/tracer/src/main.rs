#[tokio::main]
async fn main() {
    tracer::start(std::env::args()).await;
}
