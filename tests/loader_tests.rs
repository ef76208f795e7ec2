//! Asset Loader Tests
//!
//! Tests for:
//! - Cache hits producing independent clones
//! - In-flight request coalescing (one decode per id)
//! - Primary / fallback decoding paths
//! - Timeout racing and retry after failure
//! - Preload reports and detached load tasks

mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use myth_placement::assets::{AssetId, InstanceOrigin, LoadState, LoaderOptions};
use myth_placement::errors::PlacementError;
use myth_placement::resources::ResourceDisposer;

use common::{CountingDecoder, SAMPLE_GEOMETRIES, SAMPLE_MATERIALS, SAMPLE_TEXTURES, Script};

fn options(timeout_ms: u64) -> LoaderOptions {
    LoaderOptions {
        timeout: Duration::from_millis(timeout_ms),
        fallback: true,
    }
}

// ============================================================================
// Cache & Coalescing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn cached_request_returns_fresh_clone() {
    common::init_logger();
    let decoder = CountingDecoder::new();
    let (loader, registry) = common::loader_with(decoder.clone(), 1, LoaderOptions::default());

    let first = loader.request(AssetId(1)).await.unwrap();
    let second = loader.request(AssetId(1)).await.unwrap();

    assert_eq!(decoder.call_count(), 1);
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Cached);
    assert_eq!(first.origin(), InstanceOrigin::Decoded);
    assert_eq!(second.origin(), InstanceOrigin::Cloned);

    // Each instance owns its own GPU handles
    assert_ne!(first.geometry_handles(), second.geometry_handles());
    assert_eq!(registry.live().geometries, 2 * SAMPLE_GEOMETRIES);
}

#[tokio::test(start_paused = true)]
async fn concurrent_requests_share_one_decode() {
    let decoder = CountingDecoder::new();
    decoder.delay(1, Duration::from_millis(50));
    let (loader, _) = common::loader_with(decoder.clone(), 1, LoaderOptions::default());

    let (a, b) = tokio::join!(loader.request(AssetId(1)), loader.request(AssetId(1)));

    assert_eq!(decoder.call_count(), 1);
    assert_eq!(loader.loads_started(), 1);
    let mut origins = vec![a.unwrap().origin(), b.unwrap().origin()];
    origins.sort_by_key(|o| *o == InstanceOrigin::Cloned);
    assert_eq!(origins, vec![InstanceOrigin::Decoded, InstanceOrigin::Cloned]);
}

#[tokio::test(start_paused = true)]
async fn state_is_in_flight_while_decoding() {
    let decoder = CountingDecoder::new();
    decoder.delay(1, Duration::from_millis(100));
    let (loader, _) = common::loader_with(decoder, 1, LoaderOptions::default());

    let pending = {
        let loader = Arc::clone(&loader);
        tokio::spawn(async move { loader.request(AssetId(1)).await.map(|i| i.asset()) })
    };
    common::settle().await;
    assert_eq!(loader.load_state(AssetId(1)), LoadState::InFlight);

    assert_eq!(pending.await.unwrap().unwrap(), AssetId(1));
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Cached);
}

#[tokio::test(start_paused = true)]
async fn disposing_an_instance_leaves_template_intact() {
    let decoder = CountingDecoder::new();
    let (loader, registry) = common::loader_with(decoder, 1, LoaderOptions::default());
    let disposer = ResourceDisposer::new(Arc::clone(&registry));

    let mut first = loader.request(AssetId(1)).await.unwrap();
    disposer.release(&mut first);
    assert_eq!(registry.live().total(), 0);

    let second = loader.request(AssetId(1)).await.unwrap();
    for handle in second.geometry_handles() {
        assert!(registry.is_geometry_live(handle));
    }
    assert_eq!(registry.live().materials, SAMPLE_MATERIALS);
    assert_eq!(registry.live().textures, SAMPLE_TEXTURES);
}

#[tokio::test(start_paused = true)]
async fn unknown_asset_is_rejected_without_state_change() {
    let decoder = CountingDecoder::new();
    let (loader, _) = common::loader_with(decoder.clone(), 2, LoaderOptions::default());

    let err = loader.request(AssetId(42)).await.unwrap_err();
    assert!(matches!(err, PlacementError::UnknownAsset(AssetId(42))));
    assert_eq!(loader.load_state(AssetId(42)), LoadState::NotRequested);
    assert_eq!(loader.loads_started(), 0);
    assert_eq!(decoder.call_count(), 0);
}

// ============================================================================
// Fallback Decoding
// ============================================================================

#[tokio::test(start_paused = true)]
async fn fallback_path_recovers_primary_failure() {
    let decoder = CountingDecoder::new();
    decoder.script(
        1,
        Script {
            fail_primary: true,
            ..Default::default()
        },
    );
    let (loader, _) = common::loader_with(decoder.clone(), 1, LoaderOptions::default());

    let instance = loader.request(AssetId(1)).await.unwrap();
    assert_eq!(instance.asset(), AssetId(1));

    let paths: Vec<bool> = decoder.calls_for(1).iter().map(|o| o.compression).collect();
    assert_eq!(paths, vec![true, false]);
}

#[tokio::test(start_paused = true)]
async fn both_paths_failing_marks_failed_and_retry_starts_over() {
    let decoder = CountingDecoder::new();
    decoder.fail(1);
    let (loader, _) = common::loader_with(decoder.clone(), 1, LoaderOptions::default());

    let err = loader.request(AssetId(1)).await.unwrap_err();
    match &err {
        PlacementError::DecodeFailure { id, primary, fallback } => {
            assert_eq!(*id, AssetId(1));
            assert!(primary.contains("primary"));
            assert!(fallback.contains("fallback"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_retryable());
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Failed);
    assert!(loader.last_error(AssetId(1)).is_some());

    decoder.heal(1);
    loader.request(AssetId(1)).await.unwrap();
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Cached);
    assert_eq!(loader.loads_started(), 2);
    assert_eq!(decoder.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn disabled_fallback_fails_after_primary() {
    let decoder = CountingDecoder::new();
    decoder.script(
        1,
        Script {
            fail_primary: true,
            ..Default::default()
        },
    );
    let opts = LoaderOptions {
        fallback: false,
        ..LoaderOptions::default()
    };
    let (loader, _) = common::loader_with(decoder.clone(), 1, opts);

    let err = loader.request(AssetId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        PlacementError::DecodeFailure { ref fallback, .. } if fallback == "disabled"
    ));
    assert_eq!(decoder.call_count(), 1);
}

// ============================================================================
// Timeout
// ============================================================================

#[tokio::test(start_paused = true)]
async fn slow_decode_times_out_then_retries() {
    let decoder = CountingDecoder::new();
    decoder.delay(1, Duration::from_millis(150));
    let (loader, registry) = common::loader_with(decoder.clone(), 1, options(100));

    let err = loader.request(AssetId(1)).await.unwrap_err();
    assert!(matches!(
        err,
        PlacementError::Timeout { id: AssetId(1), after } if after == Duration::from_millis(100)
    ));
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Failed);

    // The abandoned decode must not land in the cache later
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Failed);
    assert_eq!(registry.live().total(), 0);

    decoder.heal(1);
    assert!(loader.request(AssetId(1)).await.is_ok());
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Cached);
}

#[tokio::test(start_paused = true)]
async fn load_settles_after_every_caller_gave_up() {
    let decoder = CountingDecoder::new();
    decoder.delay(1, Duration::from_millis(50));
    let (loader, _) = common::loader_with(decoder, 1, LoaderOptions::default());

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), loader.request(AssetId(1))).await;
    assert!(abandoned.is_err());
    assert_eq!(loader.load_state(AssetId(1)), LoadState::InFlight);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(loader.load_state(AssetId(1)), LoadState::Cached);
}

// ============================================================================
// Preload & Progress
// ============================================================================

#[tokio::test(start_paused = true)]
async fn preload_tolerates_individual_failures() {
    let decoder = CountingDecoder::new();
    decoder.fail(2);
    let (loader, registry) = common::loader_with(decoder, 3, LoaderOptions::default());

    let report = loader.preload_all().await;

    assert_eq!(report.requested, 3);
    assert_eq!(report.succeeded, 2);
    assert!(!report.all_succeeded());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, AssetId(2));
    assert_eq!(loader.cached_count(), 2);

    // Warming the cache allocates no instance resources
    assert_eq!(registry.live().total(), 0);
}

#[tokio::test(start_paused = true)]
async fn progress_listener_receives_fractions() {
    let decoder = CountingDecoder::new();
    let (loader, _) = common::loader_with(decoder, 1, LoaderOptions::default());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    loader.set_progress_listener(Some(Arc::new(move |id, fraction| {
        sink.lock().push((id, fraction));
    })));

    loader.request(AssetId(1)).await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen.first(), Some(&(AssetId(1), 0.0)));
    assert_eq!(seen.last(), Some(&(AssetId(1), 1.0)));
}

#[tokio::test(start_paused = true)]
async fn clear_drops_cached_templates() {
    let decoder = CountingDecoder::new();
    let (loader, _) = common::loader_with(decoder.clone(), 1, LoaderOptions::default());

    loader.request(AssetId(1)).await.unwrap();
    loader.clear();
    assert_eq!(loader.load_state(AssetId(1)), LoadState::NotRequested);

    loader.request(AssetId(1)).await.unwrap();
    assert_eq!(decoder.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn clear_keeps_in_flight_loads_joinable() {
    let decoder = CountingDecoder::new();
    decoder.delay(1, Duration::from_millis(100));
    let (loader, _) = common::loader_with(decoder.clone(), 1, LoaderOptions::default());

    let (first, second) = tokio::join!(loader.request(AssetId(1)), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        loader.clear();
        assert_eq!(loader.load_state(AssetId(1)), LoadState::InFlight);
        loader.request(AssetId(1)).await
    });

    assert!(first.is_ok());
    assert_eq!(second.unwrap().origin(), InstanceOrigin::Cloned);
    assert_eq!(decoder.call_count(), 1);
    assert_eq!(loader.loads_started(), 1);

    // The cleared load was handed out but not cached
    assert_eq!(loader.load_state(AssetId(1)), LoadState::NotRequested);
}
