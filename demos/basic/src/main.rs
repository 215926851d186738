use filestorage_core::FileStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let storage = FileStorage::new("demo-storage").await?;
    let stored = storage
        .put("hello.txt", b"Hello from the demo crate!")
        .await?;
    println!("stored {} ({} bytes)", stored.filename, stored.size);

    let contents = storage.get("hello.txt").await?;
    println!("{}", String::from_utf8_lossy(&contents));

    println!("files: {:?}", storage.list().await?);
    println!("metrics: {:?}", storage.metrics().await?);

    if let Err(err) = storage.put("../escape.txt", b"nope").await {
        println!("rejected: {err}");
    }
    Ok(())
}
