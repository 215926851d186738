#[cfg(test)]
mod tests {
    use filestorage_core::FileStorage;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_lists_and_reads_files() {
        let tmp = tempdir().unwrap();
        let storage = FileStorage::new(tmp.path()).await.unwrap();

        let stored = storage.put("smoke.txt", b"smoke").await.unwrap();
        assert_eq!(stored.size, 5);
        assert_eq!(storage.list().await.unwrap(), vec!["smoke.txt"]);

        let bytes = storage.get("smoke.txt").await.unwrap();
        assert_eq!(bytes, b"smoke");

        let metrics = storage.metrics().await.unwrap();
        assert_eq!(metrics.files_current, 1);
        assert_eq!(metrics.files_stored_total, 1);
    }
}
