mod common;

use common::{intake, PageFetcher, ScriptedProvider};
use recipe_intake::providers::prompt::{CONDENSE_STEPS_PROMPT, EXTRACT_STEPS_PROMPT};
use std::sync::Arc;

const SALAD_URL: &str = "https://recipes.example/summer-salad";

/// Schema markup with two usable steps and a plugin card with four.
const SALAD_PAGE: &str = r#"
<html>
<head>
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Recipe",
  "name": "Summer Salad",
  "recipeIngredient": ["2 tomatoes", "1 cucumber"],
  "recipeInstructions": [
    {"@type": "HowToStep", "text": "Slice the tomatoes and cucumber into thin rounds."},
    {"@type": "HowToStep", "text": "Toss everything with olive oil and flaky salt."},
    {"@type": "HowToStep", "text": "Enjoy!"}
  ]
}
</script>
</head>
<body>
<h1>Summer Salad</h1>
<ul class="wprm-recipe-ingredients-container">
  <li>2 tomatoes</li>
  <li>1 cucumber</li>
  <li>3 tablespoons olive oil</li>
</ul>
<div class="wprm-recipe-instructions-container">
  <ol>
    <li>Slice the tomatoes and cucumber into thin rounds.</li>
    <li>Arrange the slices on a wide platter, overlapping slightly.</li>
    <li>Drizzle with the olive oil and sprinkle with flaky salt.</li>
    <li>Let the salad rest for 10 minutes before serving.</li>
  </ol>
</div>
</body>
</html>
"#;

const PROSE_PAGE: &str = r#"
<html><body>
<h1>Weeknight Dal</h1>
<p>My grandmother made this every Sunday. First rinse the lentils, then simmer them
with turmeric for twenty minutes, temper the cumin seeds in ghee and stir it in.</p>
</body></html>
"#;

#[tokio::test]
async fn test_two_schema_steps_fall_through_to_html_heuristic() {
    let provider = Arc::new(ScriptedProvider::new());
    let fetcher = Arc::new(PageFetcher::default().with_page(SALAD_URL, SALAD_PAGE));

    let staged = intake(provider.clone(), fetcher.clone())
        .from_url(SALAD_URL, "Ana")
        .await
        .unwrap();

    assert_eq!(staged.draft.title, "Summer Salad");
    assert_eq!(staged.draft.steps.len(), 4);
    assert!(staged.draft.steps[1].starts_with("Arrange the slices"));
    assert_eq!(staged.draft.ingredients.len(), 3);
    assert_eq!(staged.draft.source_url.as_deref(), Some(SALAD_URL));
    assert_eq!(staged.draft.contributor_name, "Ana");
    assert!(staged.draft.tags.contains("vegan"));

    // The heuristic stage was sufficient, so the model only saw the condense call.
    assert_eq!(provider.calls_to(EXTRACT_STEPS_PROMPT), 0);
    assert_eq!(provider.calls_to(CONDENSE_STEPS_PROMPT), 1);
    assert_eq!(fetcher.requests(), 1);
}

#[tokio::test]
async fn test_prose_page_uses_generative_steps_and_page_heading() {
    let url = "https://recipes.example/dal";
    let provider = Arc::new(ScriptedProvider::new().on(
        EXTRACT_STEPS_PROMPT,
        r#"{"steps": [
            "Rinse the lentils under cold water until it runs clear.",
            "Simmer the lentils with turmeric for twenty minutes.",
            "Temper the cumin seeds in hot ghee and stir into the dal."
        ]}"#,
    ));
    let fetcher = Arc::new(PageFetcher::default().with_page(url, PROSE_PAGE));

    let staged = intake(provider.clone(), fetcher)
        .from_url(url, "")
        .await
        .unwrap();

    assert_eq!(staged.draft.title, "Weeknight Dal");
    assert_eq!(staged.draft.steps.len(), 3);
    assert_eq!(provider.calls_to(EXTRACT_STEPS_PROMPT), 1);
    assert!(provider.user_contents()[0].contains("grandmother"));

    // Steps only, no ingredient list: diet cannot be judged.
    assert!(staged.draft.ingredients.is_empty());
    assert!(!staged.draft.tags.contains("vegan"));
    assert!(!staged.draft.tags.contains("vegetarian"));
}

#[tokio::test]
async fn test_exhausted_cascade_is_insufficient_content() {
    let url = "https://recipes.example/dal";
    let provider = Arc::new(ScriptedProvider::new().on(EXTRACT_STEPS_PROMPT, r#"{"steps": []}"#));
    let fetcher = Arc::new(PageFetcher::default().with_page(url, PROSE_PAGE));

    let err = intake(provider, fetcher).from_url(url, "").await.unwrap_err();
    assert_eq!(err.kind(), "insufficient_content");
}

#[tokio::test]
async fn test_policy_violations_never_reach_the_fetcher() {
    let provider = Arc::new(ScriptedProvider::new());
    let fetcher = Arc::new(PageFetcher::default());
    let intake = intake(provider.clone(), fetcher.clone());

    let long_url = format!("https://recipes.example/{}", "a".repeat(2100));
    for url in [
        "ftp://recipes.example/salad",
        "http://127.0.0.1:8080/admin",
        "http://169.254.169.254/latest/meta-data/",
        "http://[::1]/",
        long_url.as_str(),
    ] {
        let err = intake.from_url(url, "").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_source", "{url}");
    }

    assert_eq!(fetcher.requests(), 0);
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn test_missing_page_is_fetch_failed() {
    let provider = Arc::new(ScriptedProvider::new());
    let fetcher = Arc::new(PageFetcher::default());

    let err = intake(provider, fetcher.clone())
        .from_url("https://recipes.example/gone", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "fetch_failed");
    assert_eq!(fetcher.requests(), 1);
}
