use sep2md::batch::{fetch_entry_urls, scrape_all};
use sep2md::test_utils::fixtures::{APPENDIX_HTML, ARTICLE_HTML, CONTENTS_HTML, MACROS_JS};
use sep2md::test_utils::server::{Route, serve, test_config, test_fetcher, test_fetcher_with};
use sep2md::{ScrapeError, scrape_article};
use tempfile::TempDir;

#[tokio::test]
async fn test_scrape_article_with_macros_and_appendix() {
    let base = serve(vec![
        Route::ok("/entries/test/", ARTICLE_HTML),
        Route::ok("/entries/test/local.js", MACROS_JS),
        Route::ok("/entries/test/appendix.html", APPENDIX_HTML),
    ])
    .await;
    let fetcher = test_fetcher(30);
    let url = format!("{base}/entries/test/");

    let output = scrape_article(&fetcher, &url).await.unwrap();

    assert!(output.starts_with("---\ntitle: \"Test\"\nauthor: \"Jane Doe\""));
    assert!(output.contains(&format!("url: \"{url}\"")));
    assert!(output.contains(r"${\mathbb R}^2$"));
    let appendix = output.find("## Appendix A. Proofs").unwrap();
    let notes = output.find("## Notes").unwrap();
    assert!(appendix < notes);
}

#[tokio::test]
async fn test_missing_appendix_and_macros_degrade_gracefully() {
    let base = serve(vec![Route::ok("/entries/test/", ARTICLE_HTML)]).await;
    let fetcher = test_fetcher(30);

    let output = scrape_article(&fetcher, &format!("{base}/entries/test/"))
        .await
        .unwrap();

    assert!(!output.contains("## Appendix"));
    assert!(output.contains(r"$\R^2$"));
    assert!(output.contains("## Bibliography"));
}

#[tokio::test]
async fn test_scrape_article_errors() {
    let base = serve(vec![]).await;
    let fetcher = test_fetcher(30);

    let err = scrape_article(&fetcher, &format!("{base}/entries/nonexistent/"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Status { status: 404, .. }));

    let err = scrape_article(&fetcher, &format!("{base}/contents.html"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidPath(_)));

    let err = scrape_article(&fetcher, "https://example.com/entries/x/")
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::InvalidDomain(_)));
}

#[tokio::test]
async fn test_batch_run_from_contents_page() {
    let contents = CONTENTS_HTML.replace("https://plato.stanford.edu", "");
    let base = serve(vec![
        Route::ok("/contents.html", &contents),
        Route::ok("/entries/abduction/", ARTICLE_HTML),
        Route::ok("/entries/kant/", ARTICLE_HTML),
    ])
    .await;

    let mut config = test_config(30);
    config.contents_url = format!("{base}/contents.html");
    let fetcher = test_fetcher_with(config);

    let urls = fetch_entry_urls(&fetcher).await.unwrap();
    assert_eq!(
        urls,
        vec![
            format!("{base}/entries/abduction/"),
            format!("{base}/entries/kant/"),
            format!("{base}/entries/zeno-elea/"),
        ]
    );

    let dir = TempDir::new().unwrap();
    let report = scrape_all(&fetcher, &urls, dir.path(), 2).await;
    assert_eq!(report.summary(), "Completed: 2 scraped, 0 skipped, 1 failed");
    assert!(dir.path().join("abduction.md").exists());
    assert!(dir.path().join("kant.md").exists());
    assert!(!dir.path().join("zeno-elea.md").exists());

    let rerun = scrape_all(&fetcher, &urls, dir.path(), 2).await;
    assert_eq!(rerun.summary(), "Completed: 0 scraped, 2 skipped, 1 failed");
}
