//! Answer resolution order across the image / model / search matrix.

use hintd::capture::{CaptureManager, FakeCapture};
use hintd::config::CaptureConfig;
use hintd::game_context::GameContext;
use hintd::llm::{FakeModel, ModelClient};
use hintd::resolver::{AnswerResolver, Query, NOT_FOUND_MESSAGE, UNAVAILABLE_MESSAGE};
use hintd::search::{FakeSearch, WebSearch};
use std::sync::Arc;
use tempfile::TempDir;

const VISION_ANSWER: &str = "The door opens with the red key on the left.";
const TEXT_ANSWER: &str = "Try the lever behind the waterfall.";

struct Fixture {
    _root: TempDir,
    capture: Arc<CaptureManager>,
}

impl Fixture {
    async fn new(with_image: bool) -> Self {
        let root = TempDir::new().unwrap();
        let config = CaptureConfig {
            screenshot_dir: root.path().join("screenshots"),
            cache_dir: root.path().join("cache"),
            ..CaptureConfig::default()
        };
        let capture = Arc::new(CaptureManager::new(config, Arc::new(FakeCapture::new())));
        if with_image {
            capture.capture_once().await.unwrap();
        }
        Self {
            _root: root,
            capture,
        }
    }

    fn resolver(&self, model: Option<&FakeModel>, search: Option<&FakeSearch>) -> AnswerResolver {
        AnswerResolver::new(
            model.map(|m| Arc::new(m.clone()) as Arc<dyn ModelClient>),
            search.map(|s| Arc::new(s.clone()) as Arc<dyn WebSearch>),
            Arc::clone(&self.capture),
        )
    }
}

fn query(text: &str) -> Query {
    Query::parse(text).unwrap()
}

fn working_model() -> FakeModel {
    FakeModel::failing().vision(VISION_ANSWER).text(TEXT_ANSWER)
}

#[tokio::test]
async fn test_resolve_never_empty_across_matrix() {
    for with_image in [false, true] {
        for with_model in [false, true] {
            for with_results in [false, true] {
                let fixture = Fixture::new(with_image).await;
                let model = working_model();
                let search = if with_results {
                    FakeSearch::with_titles(&["Boss Guide", "Wiki"]).content("Dodge left twice.")
                } else {
                    FakeSearch::empty()
                };
                let resolver = fixture.resolver(with_model.then_some(&model), Some(&search));

                let answer = resolver.resolve(&query("how do I win?"), &GameContext::new()).await;
                assert!(
                    !answer.trim().is_empty(),
                    "empty answer for image={} model={} results={}",
                    with_image,
                    with_model,
                    with_results
                );
            }
        }
    }
}

#[tokio::test]
async fn test_vision_answer_short_circuits_search_and_text() {
    let fixture = Fixture::new(true).await;
    let model = working_model();
    let search = FakeSearch::with_titles(&["Guide"]).content("page");
    let resolver = fixture.resolver(Some(&model), Some(&search));

    let answer = resolver.resolve(&query("which key?"), &GameContext::new()).await;

    assert_eq!(answer, VISION_ANSWER);
    assert_eq!(model.vision_calls(), 1);
    assert_eq!(model.text_calls(), 0);
    assert_eq!(search.search_calls(), 0);
}

#[tokio::test]
async fn test_no_image_skips_vision_and_uses_search_content() {
    let fixture = Fixture::new(false).await;
    let model = working_model();
    let search = FakeSearch::with_titles(&["Guide"]).content("Hold jump to glide.");
    let resolver = fixture.resolver(Some(&model), Some(&search));

    let answer = resolver.resolve(&query("cross the gap"), &GameContext::new()).await;

    assert_eq!(answer, "Found helpful information:\n\nHold jump to glide....");
    assert_eq!(model.vision_calls(), 0);
    assert_eq!(model.text_calls(), 0);
    assert_eq!(search.fetch_calls(), 1);
}

#[tokio::test]
async fn test_failed_vision_falls_through_to_search() {
    let fixture = Fixture::new(true).await;
    let model = FakeModel::failing().text(TEXT_ANSWER);
    let search = FakeSearch::with_titles(&["Guide"]).content("Use the bombs.");
    let resolver = fixture.resolver(Some(&model), Some(&search));

    let answer = resolver.resolve(&query("open the wall"), &GameContext::new()).await;

    assert!(answer.starts_with("Found helpful information:"));
    assert_eq!(model.vision_calls(), 1);
    assert_eq!(search.search_calls(), 1);
}

#[tokio::test]
async fn test_results_without_content_list_titles() {
    let fixture = Fixture::new(false).await;
    let search = FakeSearch::with_titles(&["One", "Two", "Three", "Four"]);
    let resolver = fixture.resolver(None, Some(&search));

    let answer = resolver.resolve(&query("secret ending"), &GameContext::new()).await;

    assert_eq!(answer, "Found these resources:\n• One\n• Two\n• Three");
}

#[tokio::test]
async fn test_empty_search_answers_not_found_without_text_model() {
    let fixture = Fixture::new(false).await;
    let model = working_model();
    let search = FakeSearch::empty();
    let resolver = fixture.resolver(Some(&model), Some(&search));

    let answer = resolver.resolve(&query("best build"), &GameContext::new()).await;

    assert_eq!(answer, NOT_FOUND_MESSAGE);
    assert_eq!(search.search_calls(), 1);
    assert_eq!(model.text_calls(), 0);
}

#[tokio::test]
async fn test_empty_search_without_model_is_not_found() {
    let fixture = Fixture::new(false).await;
    let search = FakeSearch::empty();
    let resolver = fixture.resolver(None, Some(&search));

    let answer = resolver.resolve(&query("best build"), &GameContext::new()).await;
    assert_eq!(answer, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_search_disabled_uses_text_model() {
    let fixture = Fixture::new(false).await;
    let model = working_model();
    let resolver = fixture.resolver(Some(&model), None);

    let answer = resolver.resolve(&query("best build"), &GameContext::new()).await;

    assert_eq!(answer, TEXT_ANSWER);
    assert_eq!(model.vision_calls(), 0);
    assert_eq!(model.text_calls(), 1);
}

#[tokio::test]
async fn test_search_disabled_and_text_model_failing_is_unavailable() {
    let fixture = Fixture::new(true).await;
    let model = FakeModel::failing();
    let resolver = fixture.resolver(Some(&model), None);

    let answer = resolver.resolve(&query("best build"), &GameContext::new()).await;

    assert_eq!(answer, UNAVAILABLE_MESSAGE);
    assert_eq!(model.vision_calls(), 1);
    assert_eq!(model.text_calls(), 1);
}

#[tokio::test]
async fn test_nothing_configured_is_unavailable() {
    let fixture = Fixture::new(true).await;
    let resolver = fixture.resolver(None, None);

    let answer = resolver.resolve(&query("anything"), &GameContext::new()).await;
    assert_eq!(answer, UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn test_search_uses_current_game() {
    let fixture = Fixture::new(false).await;
    let search = FakeSearch::empty();
    let resolver = fixture.resolver(None, Some(&search));

    let context = GameContext::new();
    context.set("Celeste").await;
    resolver.resolve(&query("find the key"), &context).await;

    assert_eq!(
        search.queries(),
        vec!["Celeste find the key guide walkthrough tips".to_string()]
    );
}
