//! Tests for channel lifecycle: registration, removal and clearing

#[cfg(test)]
mod tests {
    use crate::queue::api::{MultiChannelQueue, QueueError};
    use std::time::Duration;

    #[tokio::test]
    async fn test_remove_channel_returns_buffered_items() {
        // Removal hands back whatever was still buffered
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(10);
        queue.add_channel("c1".to_string(), 5, 1).unwrap();

        queue.add(&"c1".to_string(), "a".to_string()).await.unwrap();
        queue.add(&"c1".to_string(), "b".to_string()).await.unwrap();

        let remaining = queue.remove_channel(&"c1".to_string()).unwrap();
        let payloads: Vec<&str> = remaining.iter().map(|item| item.as_str()).collect();
        assert_eq!(payloads, vec!["a", "b"]);

        // The channel is gone: adding to it is a usage error, not a timeout
        let result = queue.add(&"c1".to_string(), "x".to_string()).await;
        assert!(matches!(result, Err(QueueError::ChannelNotFound { .. })));

        assert!(!queue.contains_channel(&"c1".to_string()));
        assert_eq!(queue.buffered_len(), 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_channel_is_empty() {
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(10);
        assert!(queue.remove_channel(&"missing".to_string()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_removed_channel_items_are_not_delivered() {
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(10);
        queue.add_channel("c1".to_string(), 5, 2).unwrap();
        queue.add_channel("c2".to_string(), 5, 2).unwrap();

        queue.add(&"c1".to_string(), "gone".to_string()).await.unwrap();
        queue.add(&"c2".to_string(), "kept".to_string()).await.unwrap();

        queue.remove_channel(&"c1".to_string()).unwrap();

        let (id, item) = queue.take().await.unwrap();
        assert_eq!(id, "c2");
        assert_eq!(*item, "kept");
        queue.consumed(&id).unwrap();

        assert!(queue
            .take_timeout(Duration::from_millis(20))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_consumed_after_channel_removal_restores_global_capacity() {
        // Global cap of 1: the permit held by the in-flight item must come
        // back even though its channel no longer exists
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(1);
        queue.add_channel("c1".to_string(), 5, 1).unwrap();
        queue.add_channel("c2".to_string(), 5, 1).unwrap();

        queue.add(&"c1".to_string(), "a".to_string()).await.unwrap();
        let (id, _) = queue.take().await.unwrap();

        queue.remove_channel(&"c1".to_string()).unwrap();

        queue.add(&"c2".to_string(), "b".to_string()).await.unwrap();
        assert!(queue
            .take_timeout(Duration::from_millis(20))
            .await
            .unwrap()
            .is_none());

        queue.consumed(&id).unwrap();

        let (id, item) = queue.take().await.unwrap();
        assert_eq!(id, "c2");
        assert_eq!(*item, "b");
        queue.consumed(&id).unwrap();
    }

    #[tokio::test]
    async fn test_clear_empties_structure_but_not_permits() {
        // Clear drops buffers and registry, but held permits survive
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(2);
        queue.add_channel("c1".to_string(), 5, 2).unwrap();
        queue.add_channel("c2".to_string(), 5, 2).unwrap();

        queue.add(&"c1".to_string(), "a".to_string()).await.unwrap();
        queue.add(&"c1".to_string(), "b".to_string()).await.unwrap();
        queue.add(&"c2".to_string(), "c".to_string()).await.unwrap();

        let (taken_id, _) = queue.take().await.unwrap();

        queue.clear().unwrap();

        assert_eq!(queue.channel_count(), 0);
        assert_eq!(queue.buffered_len(), 0);
        assert!(queue
            .take_timeout(Duration::from_millis(20))
            .await
            .unwrap()
            .is_none());

        // The delivered item is still in flight after the clear
        assert_eq!(queue.stats().in_flight, 1);

        // Its consumed call still closes it out and returns the permit
        queue.consumed(&taken_id).unwrap();
        assert_eq!(queue.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_reregistration_after_clear() {
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(4);
        queue.add_channel("c1".to_string(), 5, 1).unwrap();
        queue.add(&"c1".to_string(), "old".to_string()).await.unwrap();

        queue.clear().unwrap();

        // The id is free again and the new channel starts empty
        assert!(queue.add_channel("c1".to_string(), 3, 1).unwrap());
        queue.add(&"c1".to_string(), "new".to_string()).await.unwrap();

        let (id, item) = queue.take().await.unwrap();
        assert_eq!(*item, "new");
        queue.consumed(&id).unwrap();
    }

    #[tokio::test]
    async fn test_reregistration_after_removal_starts_fresh() {
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(4);
        queue.add_channel("c1".to_string(), 1, 1).unwrap();
        queue.add(&"c1".to_string(), "old".to_string()).await.unwrap();

        queue.remove_channel(&"c1".to_string()).unwrap();
        assert!(queue.add_channel("c1".to_string(), 1, 1).unwrap());

        // Fresh buffer: capacity 1 is available despite the old buffered item
        assert!(queue
            .add_timeout(
                &"c1".to_string(),
                "new".to_string(),
                Duration::from_millis(50)
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_consumed_on_unknown_channel_is_harmless() {
        let queue: MultiChannelQueue<String, String> = MultiChannelQueue::new(4);
        queue.consumed(&"never-registered".to_string()).unwrap();
    }
}
