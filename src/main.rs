#[tokio::main]
async fn main() {
    httpjob::boot::boot().await;
}
