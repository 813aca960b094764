//! End-to-end pipeline scenarios over stub collaborators and a real
//! in-memory cache store.

use std::time::Duration;

use dp_core::CacheStore;
use dp_pipeline::testing::{papers, PipelineBuilder, StubGenerator, CONVERSATION_JSON};
use dp_pipeline::{rss, CONVERSATION_KEY, FEED_KEY, PODCAST_KEY, SUMMARY_KEY};

#[tokio::test]
async fn two_papers_flow_into_the_feed_and_a_single_summary_call() {
    let builder = PipelineBuilder::new()
        .papers(papers(2))
        .generator(StubGenerator::always("<h2>Headline</h2>"))
        .with_memory_cache();
    let prompts = builder.prompts();
    let generator_calls = builder.generator_calls();
    let pipeline = builder.build();

    let feed = pipeline.feed("https://example.org/feed").await.unwrap();
    let channel = rss::parse(std::str::from_utf8(&feed).unwrap()).unwrap();
    assert_eq!(channel.items.len(), 2);

    pipeline.summary("https://example.org/summary").await.unwrap();

    assert_eq!(generator_calls.get(), 1);
    let prompts = prompts.lock().unwrap();
    assert!(prompts[0].contains("Paper 1"));
    assert!(prompts[0].contains("Paper 2"));
}

#[tokio::test]
async fn a_warm_podcast_key_touches_no_upstream_service() {
    let builder = PipelineBuilder::new().with_memory_cache();
    let source_calls = builder.source_calls();
    let generator_calls = builder.generator_calls();
    let synthesizer_calls = builder.synthesizer_calls();
    let store = builder.memory_store().unwrap();
    let pipeline = builder.build();

    store
        .set(PODCAST_KEY, b"cached audio bytes", Duration::from_secs(600))
        .await
        .unwrap();

    let audio = pipeline.podcast("https://example.org/podcast").await.unwrap();

    assert_eq!(audio, b"cached audio bytes");
    assert_eq!(source_calls.get(), 0);
    assert_eq!(generator_calls.get(), 0);
    assert_eq!(synthesizer_calls.get(), 0);
}

#[tokio::test]
async fn a_failed_refresh_keeps_earlier_writes_and_the_stale_podcast() {
    let builder = PipelineBuilder::new()
        .papers(papers(3))
        .generator(StubGenerator::scripted(vec![
            Ok("<h2>Fresh headline</h2>".into()),
            Ok(CONVERSATION_JSON.into()),
        ]))
        .synthesizer(dp_pipeline::testing::StubSynthesizer::failing(
            "voice service down",
        ))
        .with_memory_cache();
    let store = builder.memory_store().unwrap();
    let pipeline = builder.build();

    store
        .set(PODCAST_KEY, b"yesterday's podcast", Duration::from_secs(600))
        .await
        .unwrap();

    let err = pipeline.refresh_all().await.unwrap_err();
    assert!(err.to_string().starts_with("podcast stage:"), "got {err}");

    // The first three stages completed and their writes stick.
    let feed = store.get(FEED_KEY).await.unwrap().unwrap();
    let channel = rss::parse(std::str::from_utf8(&feed).unwrap()).unwrap();
    assert_eq!(channel.items.len(), 3);

    let summary = store.get(SUMMARY_KEY).await.unwrap().unwrap();
    assert!(std::str::from_utf8(&summary)
        .unwrap()
        .contains("Fresh headline"));

    let conversation = store.get(CONVERSATION_KEY).await.unwrap().unwrap();
    let decoded: dp_core::Conversation = serde_json::from_slice(&conversation).unwrap();
    assert_eq!(decoded.conversation.len(), 2);

    // The podcast entry is untouched.
    assert_eq!(
        store.get(PODCAST_KEY).await.unwrap().unwrap(),
        b"yesterday's podcast"
    );
}

#[tokio::test]
async fn refresh_regenerates_even_when_every_key_is_warm() {
    let builder = PipelineBuilder::new()
        .papers(papers(1))
        .generator(StubGenerator::scripted(vec![
            Ok("<h2>New day</h2>".into()),
            Ok(CONVERSATION_JSON.into()),
        ]))
        .with_memory_cache();
    let source_calls = builder.source_calls();
    let store = builder.memory_store().unwrap();
    let pipeline = builder.build();

    for key in [FEED_KEY, SUMMARY_KEY, CONVERSATION_KEY, PODCAST_KEY] {
        store
            .set(key, b"stale artifact", Duration::from_secs(600))
            .await
            .unwrap();
    }

    pipeline.refresh_all().await.unwrap();

    // Cache reads were bypassed: the source was consulted and every key
    // holds regenerated content.
    assert_eq!(source_calls.get(), 1);
    for key in [FEED_KEY, SUMMARY_KEY, CONVERSATION_KEY, PODCAST_KEY] {
        let value = store.get(key).await.unwrap().unwrap();
        assert_ne!(value, b"stale artifact", "key {key} was not regenerated");
    }
}

#[tokio::test]
async fn a_disabled_store_still_serves_requests_via_direct_generation() {
    let builder = PipelineBuilder::new()
        .papers(papers(2))
        .generator(StubGenerator::scripted(vec![
            Ok("<h2>Uncached</h2>".into()),
            Ok(CONVERSATION_JSON.into()),
        ]));
    let pipeline = builder.build();

    let audio = pipeline.podcast("https://example.org/podcast").await.unwrap();
    assert!(!audio.is_empty());
}
