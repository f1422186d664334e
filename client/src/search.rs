//! Debounced, cancellable free-text search over the geocoder.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use shared::{BoundingRegion, GeocodeCandidate, PlaceResult};
use tokio::sync::watch;

use crate::cancel::Supersession;
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::services::Geocoder;

/// What observers of the search box see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub candidates: Vec<GeocodeCandidate>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<GeocodeCandidate>),
    Failed(CoreError),
    /// A newer query (or `clear`) took over; state was left alone.
    Superseded,
}

pub struct GeocodeSearchController {
    geocoder: Arc<dyn Geocoder>,
    region: BoundingRegion,
    debounce: Duration,
    deadline: Duration,
    limit: usize,
    supersession: Supersession,
    state: watch::Sender<SearchState>,
    cache: Mutex<LruCache<String, Vec<GeocodeCandidate>>>,
}

impl GeocodeSearchController {
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &ClientConfig) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            geocoder,
            region: config.region.clone(),
            debounce: config.debounce,
            deadline: config.request_timeout,
            limit: config.search_limit,
            supersession: Supersession::new(),
            state,
            cache: Mutex::new(LruCache::new(config.search_cache_capacity)),
        }
    }

    /// Runs one keystroke's worth of search.
    ///
    /// Every call supersedes the previous one, so only the last input of a burst survives the
    /// debounce and only the latest request may publish its candidates.
    pub async fn submit_query(&self, text: &str) -> SearchOutcome {
        let mut ticket = self.supersession.begin();
        let query = text.trim().to_string();

        if query.is_empty() {
            self.state.send_replace(SearchState::default());
            return SearchOutcome::Results(Vec::new());
        }
        self.state.send_modify(|state| state.query = query.clone());

        if ticket.run(tokio::time::sleep(self.debounce)).await.is_err() {
            tracing::debug!("search `{query}` superseded while debouncing");
            return SearchOutcome::Superseded;
        }

        let key = query.to_lowercase();
        let cached = self
            .cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(&key).cloned());
        if let Some(candidates) = cached {
            tracing::debug!("search cache hit for `{key}`");
            self.publish_results(&candidates);
            return SearchOutcome::Results(candidates);
        }

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let request = tokio::time::timeout(
            self.deadline,
            self.geocoder.search(&query, &self.region, self.limit),
        );
        let response = match ticket.run(request).await {
            Err(_) => {
                tracing::debug!("search `{query}` superseded in flight");
                return SearchOutcome::Superseded;
            }
            Ok(Err(_)) => Err(CoreError::Timeout(self.deadline)),
            Ok(Ok(response)) => response,
        };
        if !ticket.is_current() {
            return SearchOutcome::Superseded;
        }

        match response {
            Ok(places) => {
                let candidates = self.constrain(&places);
                let (kept, found) = (candidates.len(), places.len());
                tracing::debug!("search `{query}`: {kept} of {found} places kept");
                if let Ok(mut cache) = self.cache.lock() {
                    cache.put(key, candidates.clone());
                }
                self.publish_results(&candidates);
                SearchOutcome::Results(candidates)
            }
            Err(err) => {
                tracing::warn!("search `{query}` failed: {err}");
                let message = err.user_message();
                self.state.send_modify(|state| {
                    state.candidates.clear();
                    state.loading = false;
                    state.error = Some(message);
                });
                SearchOutcome::Failed(err)
            }
        }
    }

    /// Cancels pending and in-flight work and empties the box.
    pub fn clear(&self) {
        self.supersession.cancel_all();
        self.state.send_replace(SearchState::default());
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn region(&self) -> &BoundingRegion {
        &self.region
    }

    fn constrain(&self, places: &[PlaceResult]) -> Vec<GeocodeCandidate> {
        places
            .iter()
            .filter_map(GeocodeCandidate::from_place)
            .filter(|candidate| {
                self.region.contains(candidate.lat, candidate.lng)
                    && self.region.mentioned_in(&candidate.display_name)
            })
            .take(self.limit)
            .collect()
    }

    fn publish_results(&self, candidates: &[GeocodeCandidate]) {
        self.state.send_modify(|state| {
            state.candidates = candidates.to_vec();
            state.loading = false;
            state.error = None;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::time::sleep;

    use super::*;

    fn place(id: &str, name: &str, lat: &str, lon: &str) -> PlaceResult {
        PlaceResult {
            place_id: id.to_string(),
            display_name: name.to_string(),
            lat: lat.to_string(),
            lon: lon.to_string(),
            address: None,
        }
    }

    #[derive(Default)]
    struct FakeGeocoder {
        answers: HashMap<String, (Duration, Result<Vec<PlaceResult>, CoreError>)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeGeocoder {
        fn answer(
            mut self,
            text: &str,
            delay_ms: u64,
            result: Result<Vec<PlaceResult>, CoreError>,
        ) -> Self {
            self.answers.insert(
                text.to_string(),
                (Duration::from_millis(delay_ms), result),
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(
            &self,
            text: &str,
            _region: &BoundingRegion,
            _limit: usize,
        ) -> Result<Vec<PlaceResult>, CoreError> {
            self.calls.lock().unwrap().push(text.to_string());
            let (delay, result) = self
                .answers
                .get(text)
                .cloned()
                .unwrap_or((Duration::ZERO, Ok(Vec::new())));
            sleep(delay).await;
            result
        }
    }

    fn fresno() -> PlaceResult {
        place("1", "Fresno, Fresno County, California, USA", "36.7378", "-119.7871")
    }

    fn sacramento() -> PlaceResult {
        place("2", "Sacramento, Sacramento County, CA, USA", "38.5816", "-121.4944")
    }

    fn controller(geocoder: Arc<FakeGeocoder>) -> GeocodeSearchController {
        GeocodeSearchController::new(geocoder, &ClientConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn blank_text_clears_without_calling_the_geocoder() {
        let geocoder = Arc::new(FakeGeocoder::default().answer("fresno", 0, Ok(vec![fresno()])));
        let search = controller(geocoder.clone());

        assert!(matches!(search.submit_query("fresno").await, SearchOutcome::Results(c) if c.len() == 1));
        assert_eq!(search.submit_query("   ").await, SearchOutcome::Results(Vec::new()));

        assert_eq!(search.state(), SearchState::default());
        assert_eq!(geocoder.calls(), vec!["fresno"]);
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_input_of_a_burst_is_sent() {
        let geocoder = Arc::new(FakeGeocoder::default().answer("fresno", 0, Ok(vec![fresno()])));
        let search = controller(geocoder.clone());

        let (first, second, last) = tokio::join!(
            search.submit_query("fre"),
            async {
                sleep(Duration::from_millis(100)).await;
                search.submit_query("fres").await
            },
            async {
                sleep(Duration::from_millis(200)).await;
                search.submit_query("fresno").await
            },
        );

        assert_eq!(first, SearchOutcome::Superseded);
        assert_eq!(second, SearchOutcome::Superseded);
        assert!(matches!(last, SearchOutcome::Results(ref c) if c[0].id == "1"));
        assert_eq!(geocoder.calls(), vec!["fresno"]);
    }

    #[tokio::test(start_paused = true)]
    async fn later_query_wins_over_a_slower_earlier_one() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .answer("fresno", 1_000, Ok(vec![fresno()]))
                .answer("sacramento", 10, Ok(vec![sacramento()])),
        );
        let search = controller(geocoder.clone());

        let (earlier, later) = tokio::join!(search.submit_query("fresno"), async {
            // past the first debounce, while its request is in flight
            sleep(Duration::from_millis(400)).await;
            search.submit_query("sacramento").await
        });

        assert_eq!(earlier, SearchOutcome::Superseded);
        assert!(matches!(later, SearchOutcome::Results(_)));
        assert_eq!(geocoder.calls(), vec!["fresno", "sacramento"]);

        let state = search.state();
        assert_eq!(state.query, "sacramento");
        assert_eq!(state.candidates.len(), 1);
        assert_eq!(state.candidates[0].id, "2");
        assert!(!state.loading);

        // the dropped request never comes back to overwrite the state
        sleep(Duration::from_secs(2)).await;
        assert_eq!(search.state().candidates[0].id, "2");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_clears_candidates_and_sets_an_error() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .answer("fresno", 0, Ok(vec![fresno()]))
                .answer(
                    "oakland",
                    0,
                    Err(CoreError::RemoteRejection {
                        status: 503,
                        message: "busy".into(),
                    }),
                ),
        );
        let search = controller(geocoder);

        search.submit_query("fresno").await;
        let outcome = search.submit_query("oakland").await;

        assert!(matches!(
            outcome,
            SearchOutcome::Failed(CoreError::RemoteRejection { status: 503, .. })
        ));
        let state = search.state();
        assert!(state.candidates.is_empty());
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Request failed (HTTP 503)"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geocoder_reports_timeout() {
        let geocoder = Arc::new(FakeGeocoder::default().answer("fresno", 60_000, Ok(vec![fresno()])));
        let search = controller(geocoder);

        let outcome = search.submit_query("fresno").await;

        assert_eq!(
            outcome,
            SearchOutcome::Failed(CoreError::Timeout(Duration::from_secs(10)))
        );
        assert!(search.state().error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_query_is_served_from_cache() {
        let geocoder = Arc::new(FakeGeocoder::default().answer("fresno", 0, Ok(vec![fresno()])));
        let search = controller(geocoder.clone());

        let first = search.submit_query("Fresno").await;
        let second = search.submit_query("  fresno ").await;

        assert_eq!(first, second);
        assert_eq!(geocoder.calls(), vec!["Fresno"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let geocoder = Arc::new(FakeGeocoder::default().answer(
            "fresno",
            0,
            Err(CoreError::NetworkFailure("refused".into())),
        ));
        let search = controller(geocoder.clone());

        search.submit_query("fresno").await;
        search.submit_query("fresno").await;

        assert_eq!(geocoder.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_constrained_to_the_region() {
        let geocoder = Arc::new(FakeGeocoder::default().answer(
            "springfield",
            0,
            Ok(vec![
                fresno(),
                place("3", "Springfield, Illinois, USA", "39.78", "-89.65"),
                place("4", "Reno, Nevada, USA", "39.52", "-119.81"),
                place("5", "Broken, California", "not-a-number", "-120.0"),
                sacramento(),
            ]),
        ));
        let search = controller(geocoder);

        let SearchOutcome::Results(candidates) = search.submit_query("springfield").await else {
            panic!("expected results");
        };

        let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_in_flight_search() {
        let geocoder = Arc::new(FakeGeocoder::default().answer("fresno", 1_000, Ok(vec![fresno()])));
        let search = controller(geocoder);

        let (outcome, ()) = tokio::join!(search.submit_query("fresno"), async {
            sleep(Duration::from_millis(500)).await;
            assert!(search.state().loading);
            search.clear();
        });

        assert_eq!(outcome, SearchOutcome::Superseded);
        assert_eq!(search.state(), SearchState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_loading_then_results() {
        let geocoder = Arc::new(FakeGeocoder::default().answer("fresno", 50, Ok(vec![fresno()])));
        let search = controller(geocoder);
        let mut updates = search.subscribe();

        let (_, seen_loading) = tokio::join!(search.submit_query("fresno"), async {
            updates.wait_for(|state| state.loading).await.is_ok()
        });

        assert!(seen_loading);
        assert_eq!(updates.borrow_and_update().candidates.len(), 1);
    }
}
