use queued_consumer::queue::memory::MemoryQueue;
use queued_consumer::queue::WorkQueue;
use queued_consumer::ConsumerError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

#[tokio::test]
async fn test_fifo_order() {
    let queue = MemoryQueue::new();
    for i in 0..5 {
        queue.enqueue(i).await.unwrap();
    }
    assert_eq!(queue.size().await, 5);

    for i in 0..5 {
        assert_eq!(queue.fetch().await, Some(i));
    }
    assert!(queue.is_empty().await);
    assert_eq!(queue.try_fetch().await, None);
}

#[tokio::test]
async fn test_try_enqueue_on_full_queue() {
    let queue = MemoryQueue::bounded(2);
    assert_eq!(queue.capacity(), Some(2));

    queue.try_enqueue("a").await.unwrap();
    queue.try_enqueue("b").await.unwrap();
    assert_eq!(
        queue.try_enqueue("c").await,
        Err(ConsumerError::QueueFull(2))
    );

    assert_eq!(queue.try_fetch().await, Some("a"));
    queue.try_enqueue("c").await.unwrap();
    assert_eq!(queue.size().await, 2);
}

#[tokio::test]
async fn test_enqueue_waits_for_room() {
    let queue = Arc::new(MemoryQueue::bounded(1));
    queue.enqueue(1).await.unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.enqueue(2).await })
    };

    sleep(Duration::from_millis(20)).await;
    assert!(!producer.is_finished());
    assert_eq!(queue.size().await, 1);

    assert_eq!(queue.fetch().await, Some(1));
    timeout(Duration::from_secs(1), producer)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(queue.fetch().await, Some(2));
}

#[tokio::test]
async fn test_fetch_waits_for_task() {
    let queue = Arc::new(MemoryQueue::new());

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.fetch().await })
    };

    sleep(Duration::from_millis(20)).await;
    assert!(!consumer.is_finished());

    queue.enqueue("late").await.unwrap();
    let fetched = timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap();
    assert_eq!(fetched, Some("late"));
}

#[tokio::test]
async fn test_close_wakes_fetch_and_rejects_enqueue() {
    let queue = Arc::new(MemoryQueue::<u32>::new());

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.fetch().await })
    };
    sleep(Duration::from_millis(20)).await;

    queue.close();
    assert!(queue.is_closed());

    let fetched = timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap();
    assert_eq!(fetched, None);
    assert_eq!(queue.enqueue(1).await, Err(ConsumerError::QueueClosed));
    assert_eq!(queue.try_enqueue(1).await, Err(ConsumerError::QueueClosed));
}

#[tokio::test]
async fn test_close_keeps_queued_tasks_fetchable() {
    let queue = MemoryQueue::new();
    queue.enqueue(1).await.unwrap();
    queue.enqueue(2).await.unwrap();
    queue.close();

    assert_eq!(queue.fetch().await, Some(1));
    assert_eq!(queue.try_fetch().await, Some(2));
    assert_eq!(queue.fetch().await, None);
}

#[tokio::test]
async fn test_close_wakes_blocked_producer() {
    let queue = Arc::new(MemoryQueue::bounded(1));
    queue.enqueue(1).await.unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move { queue.enqueue(2).await })
    };
    sleep(Duration::from_millis(20)).await;

    queue.close();
    let result = timeout(Duration::from_secs(1), producer).await.unwrap().unwrap();
    assert_eq!(result, Err(ConsumerError::QueueClosed));
}

#[tokio::test]
async fn test_cancelled_fetch_loses_nothing() {
    let queue = MemoryQueue::new();

    let first = timeout(Duration::from_millis(10), queue.fetch()).await;
    assert!(first.is_err());

    queue.enqueue(7).await.unwrap();
    assert_eq!(queue.fetch().await, Some(7));
}

#[tokio::test]
async fn test_concurrent_producers_no_loss() {
    let queue = Arc::new(MemoryQueue::bounded(16));
    let mut handles = vec![];

    for producer in 0..8u32 {
        let queue = Arc::clone(&queue);
        handles.push(tokio::spawn(async move {
            for i in 0..50u32 {
                queue.enqueue(producer * 1000 + i).await.unwrap();
            }
        }));
    }

    let mut seen = HashSet::new();
    while seen.len() < 400 {
        let task = timeout(Duration::from_secs(5), queue.fetch())
            .await
            .unwrap()
            .unwrap();
        assert!(seen.insert(task), "task {} fetched twice", task);
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(queue.is_empty().await);
}

#[tokio::test]
async fn test_bounded_queue_with_huge_capacity() {
    let queue = MemoryQueue::bounded(usize::MAX / 2);
    assert_eq!(queue.capacity(), Some(usize::MAX / 2));

    queue.try_enqueue(1u32).await.unwrap();
    queue.enqueue(2).await.unwrap();
    assert_eq!(queue.size().await, 2);
    assert_eq!(queue.fetch().await, Some(1));
    assert_eq!(queue.try_fetch().await, Some(2));
}
