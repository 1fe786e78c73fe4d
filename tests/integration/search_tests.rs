//! End-to-end search tests
//!
//! These tests run complete searches against wiremock servers that imitate
//! the target site: a city list on the root, per-city listings of complex
//! cards and complex detail pages.

use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};
use zhk_scout::config::{Config, CrawlMode, StopPolicy};
use zhk_scout::crawler::NO_DESCRIPTION;
use zhk_scout::{CrawlState, ScoutError, SearchStatus, Searcher};

/// Wraps a body fragment into an HTML page response
fn html(body: &str) -> ResponseTemplate {
    let page = format!(
        r#"<html><head><meta charset="utf-8"><title>Новостройки</title></head><body>{}</body></html>"#,
        body
    );
    ResponseTemplate::new(200).set_body_raw(page.into_bytes(), "text/html; charset=utf-8")
}

fn city_list(cities: &[(&str, &str)]) -> String {
    let items: String = cities
        .iter()
        .map(|(name, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, name))
        .collect();
    format!(r#"<ul class="cities">{}</ul>"#, items)
}

fn card(title: &str, href: &str, description: &str) -> String {
    format!(
        r#"<div class="complex-card">
            <h3 class="complex-card__title">{}</h3>
            <p class="complex-card__description">{}</p>
            <a href="{}">Подробнее</a>
        </div>"#,
        title, description, href
    )
}

fn detail(title: &str, description: Option<&str>) -> String {
    match description {
        Some(text) => format!(
            r#"<h1>{}</h1><div class="complex-description">{}</div>"#,
            title, text
        ),
        None => format!("<h1>{}</h1>", title),
    }
}

/// Mounts a GET page that must be requested exactly `times` times
async fn mount_page(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Default configuration pointed at the mock server, with short timeouts
fn config_for(server: &MockServer) -> Config {
    let mut config = Config::for_site(server.uri());
    config.crawler.fetch_timeout_secs = 2;
    config.crawler.connect_timeout_secs = 1;
    config
}

fn config_without_enrichment(server: &MockServer) -> Config {
    let mut config = config_for(server);
    config.crawler.enrich_details = false;
    config
}

#[tokio::test]
async fn test_first_match_stops_before_later_cities() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &city_list(&[("Краснодар", "/krasnodar"), ("Сочи", "/sochi")]),
        1,
    )
    .await;
    mount_page(
        &server,
        "/krasnodar",
        &format!(
            "{}{}",
            card("ЖК Закат", "/zhk/zakat", "Спальный район"),
            card("ЖК Рассвет", "/zhk/rassvet", "Новостройка в центре")
        ),
        1,
    )
    .await;
    mount_page(&server, "/sochi", &card("ЖК Рассвет у моря", "/zhk/sea", ""), 0).await;
    mount_page(
        &server,
        "/zhk/rassvet",
        &detail("ЖК Рассвет", Some("Монолитный дом, сдача в 2025 году")),
        1,
    )
    .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::Matched);
    assert_eq!(report.final_state, CrawlState::Matched);
    assert_eq!(report.records.len(), 1);

    let record = &report.records[0];
    assert_eq!(record.title, "ЖК Рассвет");
    assert_eq!(
        record.detail_url.as_str(),
        format!("{}/zhk/rassvet", server.uri())
    );
    assert_eq!(
        record.description.as_deref(),
        Some("Монолитный дом, сдача в 2025 году")
    );
    assert_eq!(report.stats.details_enriched, 1);
}

#[tokio::test]
async fn test_no_match_visits_every_city_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &city_list(&[
            ("Краснодар", "/krasnodar"),
            ("Сочи", "/sochi"),
            ("Анапа", "/anapa"),
        ]),
        1,
    )
    .await;
    mount_page(&server, "/krasnodar", &card("ЖК Рассвет", "/zhk/rassvet", ""), 1).await;
    mount_page(&server, "/sochi", &card("ЖК Морской", "/zhk/more", ""), 1).await;
    mount_page(&server, "/anapa", "<p>Скоро здесь появятся новостройки</p>", 1).await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let report = searcher.search("закат").await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.status, SearchStatus::NoMatchFound);
    assert_eq!(report.final_state, CrawlState::Exhausted);
    assert_eq!(report.stats.pages_fetched, 4);
    assert_eq!(report.stats.cards_seen, 2);
    assert_eq!(report.stats.gaps.get("no complex cards"), Some(&1));
}

#[tokio::test]
async fn test_page_cap_on_site_without_cities() {
    let server = MockServer::start().await;

    let root_links: String = (0..150)
        .map(|n| format!(r#"<a href="/page/{}">Страница {}</a>"#, n, n))
        .collect();
    mount_page(&server, "/", &root_links, 1).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/page/\d+$"))
        .respond_with(|request: &Request| {
            let n: usize = request
                .url
                .path()
                .rsplit('/')
                .next()
                .and_then(|segment| segment.parse().ok())
                .unwrap_or(0);
            html(&format!(
                r#"<a href="/">Главная</a><a href="/page/{}">Дальше</a><a href="/page/{}">Ещё</a>"#,
                (n + 1) % 150,
                (n + 37) % 150
            ))
        })
        .expect(99)
        .mount(&server)
        .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::CrawlBudgetExhausted);
    assert_eq!(report.final_state, CrawlState::Capped);
    assert_eq!(report.stats.pages_fetched, 100);
    assert_eq!(report.stats.pages_dispatched, 100);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 100);
    let unique: HashSet<String> = requests.iter().map(|r| r.url.path().to_string()).collect();
    assert_eq!(unique.len(), 100);
}

#[tokio::test]
async fn test_failed_city_does_not_stop_search() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &city_list(&[("Краснодар", "/krasnodar"), ("Сочи", "/sochi")]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/krasnodar"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/sochi", &card("ЖК Рассвет", "/zhk/rassvet", ""), 1).await;

    let searcher = Searcher::new(config_without_enrichment(&server)).unwrap();
    let report = searcher.search("Рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::Matched);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title, "ЖК Рассвет");
    assert_eq!(report.stats.http_failures, 1);
    assert_eq!(report.stats.failures_by_status.get(&500), Some(&1));
}

#[tokio::test]
async fn test_timed_out_city_is_skipped() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &city_list(&[("Краснодар", "/krasnodar"), ("Сочи", "/sochi")]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/krasnodar"))
        .respond_with(html(&card("ЖК Рассвет", "/zhk/slow", "")).set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;
    mount_page(&server, "/sochi", &card("ЖК Рассвет", "/zhk/rassvet", ""), 1).await;

    let searcher = Searcher::new(config_without_enrichment(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.stats.timeouts, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(
        report.records[0].detail_url.as_str(),
        format!("{}/zhk/rassvet", server.uri())
    );
}

#[tokio::test]
async fn test_root_unavailable_is_hard_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let err = searcher.search("рассвет").await.unwrap_err();

    match err {
        ScoutError::SiteUnavailable { url, source } => {
            assert_eq!(url, format!("{}/", server.uri()));
            assert_eq!(source, zhk_scout::FetchError::HttpStatus(503));
        }
        other => panic!("Expected SiteUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_root_timeout_is_hard_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("").set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let err = searcher.search("рассвет").await.unwrap_err();

    assert!(matches!(
        err,
        ScoutError::SiteUnavailable {
            source: zhk_scout::FetchError::Timeout,
            ..
        }
    ));
}

#[tokio::test]
async fn test_repeated_searches_are_identical() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&city_list(&[
            ("Краснодар", "/krasnodar"),
            ("Сочи", "/sochi"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/krasnodar"))
        .respond_with(html(&format!(
            "{}{}",
            card("ЖК Рассвет", "/zhk/rassvet", "Центр"),
            card("ЖК Рассвет-2", "/zhk/rassvet-2", "Окраина")
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sochi"))
        .respond_with(html(&card("ЖК Рассвет у моря", "/zhk/sea", "Пляж")))
        .mount(&server)
        .await;

    let mut config = config_without_enrichment(&server);
    config.crawler.stop_policy = StopPolicy::ResultCap;
    let searcher = Searcher::new(config).unwrap();

    let first = searcher.search("рассвет").await.unwrap();
    let second = searcher.search("рассвет").await.unwrap();

    assert_eq!(first.records.len(), 3);
    assert_eq!(first.records, second.records);
    assert_eq!(first.status, second.status);
}

#[tokio::test]
async fn test_result_cap_limits_records() {
    let server = MockServer::start().await;

    mount_page(&server, "/", &city_list(&[("Краснодар", "/krasnodar"), ("Сочи", "/sochi")]), 1).await;
    let cards: String = (1..=4)
        .map(|n| card(&format!("ЖК Рассвет {}", n), &format!("/zhk/rassvet-{}", n), ""))
        .collect();
    mount_page(&server, "/krasnodar", &cards, 1).await;
    mount_page(&server, "/sochi", &card("ЖК Рассвет 5", "/zhk/rassvet-5", ""), 0).await;

    let mut config = config_without_enrichment(&server);
    config.crawler.stop_policy = StopPolicy::ResultCap;
    config.crawler.result_cap = 2;
    let searcher = Searcher::new(config).unwrap();

    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.final_state, CrawlState::Matched);
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["ЖК Рассвет 1", "ЖК Рассвет 2"]);
}

#[tokio::test]
async fn test_result_cap_policy_collects_across_cities_without_duplicates() {
    let server = MockServer::start().await;

    mount_page(&server, "/", &city_list(&[("Краснодар", "/krasnodar"), ("Сочи", "/sochi")]), 1).await;
    mount_page(&server, "/krasnodar", &card("ЖК Рассвет", "/zhk/rassvet", ""), 1).await;
    mount_page(
        &server,
        "/sochi",
        &format!(
            "{}{}",
            card("ЖК Рассвет", "/zhk/rassvet", ""),
            card("ЖК Рассвет Парк", "/zhk/rassvet-park", "")
        ),
        1,
    )
    .await;

    let mut config = config_without_enrichment(&server);
    config.crawler.stop_policy = StopPolicy::ResultCap;
    let searcher = Searcher::new(config).unwrap();

    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::Matched);
    assert_eq!(report.final_state, CrawlState::Exhausted);
    let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["ЖК Рассвет", "ЖК Рассвет Парк"]);
}

#[tokio::test]
async fn test_pagination_cycle_fetched_once() {
    let server = MockServer::start().await;

    // The same city is listed twice, once with a tracking parameter
    mount_page(
        &server,
        "/",
        &city_list(&[
            ("Краснодар", "/krasnodar"),
            ("Краснодар", "/krasnodar?utm_source=menu"),
        ]),
        1,
    )
    .await;
    mount_page(
        &server,
        "/krasnodar",
        &format!(
            r#"{}<a rel="next" href="/krasnodar/page-2">Далее</a>"#,
            card("ЖК Закат", "/zhk/zakat", "")
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/krasnodar/page-2",
        &format!(
            r#"{}<a rel="next" href="/krasnodar">В начало</a>"#,
            card("ЖК Полдень", "/zhk/polden", "")
        ),
        1,
    )
    .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::NoMatchFound);
    assert_eq!(report.stats.pages_fetched, 3);
    assert_eq!(report.stats.cards_seen, 2);
}

#[tokio::test]
async fn test_trailing_slash_paths_requested_as_linked() {
    let server = MockServer::start().await;

    // The site only serves the slash-terminated spellings
    mount_page(&server, "/", &city_list(&[("Краснодар", "/krasnodar/")]), 1).await;
    mount_page(
        &server,
        "/krasnodar/",
        &card("ЖК Рассвет", "/zhk/rassvet/?source=catalog", "Кратко"),
        1,
    )
    .await;
    mount_page(
        &server,
        "/zhk/rassvet/",
        &detail("ЖК Рассвет", Some("Монолит, сдача в 2025 году")),
        1,
    )
    .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::Matched);
    assert_eq!(report.stats.total_failures(), 0);
    assert_eq!(
        report.records[0].detail_url.as_str(),
        format!("{}/zhk/rassvet/?source=catalog", server.uri())
    );
    assert_eq!(
        report.records[0].description.as_deref(),
        Some("Монолит, сдача в 2025 году")
    );

    let requested: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(requested, vec!["/", "/krasnodar/", "/zhk/rassvet/"]);
}

#[tokio::test]
async fn test_enrichment_falls_back_to_placeholder() {
    let server = MockServer::start().await;

    mount_page(&server, "/", &city_list(&[("Краснодар", "/krasnodar")]), 1).await;
    mount_page(
        &server,
        "/krasnodar",
        &format!(
            "{}{}",
            card("ЖК Рассвет", "/zhk/rassvet", "Кратко"),
            card("ЖК Рассвет-2", "/zhk/rassvet-2", "Кратко о втором")
        ),
        1,
    )
    .await;
    mount_page(&server, "/zhk/rassvet", &detail("Жилой комплекс «Рассвет»", None), 1).await;
    Mock::given(method("GET"))
        .and(path("/zhk/rassvet-2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let searcher = Searcher::new(config_for(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.records.len(), 2);

    // Detail page title wins, missing description becomes the placeholder
    assert_eq!(report.records[0].title, "Жилой комплекс «Рассвет»");
    assert_eq!(report.records[0].description.as_deref(), Some(NO_DESCRIPTION));

    // Failed detail fetch keeps the card as extracted
    assert_eq!(report.records[1].title, "ЖК Рассвет-2");
    assert_eq!(report.records[1].description.as_deref(), Some("Кратко о втором"));

    assert_eq!(report.stats.details_enriched, 1);
    assert_eq!(report.stats.failures_by_status.get(&404), Some(&1));
}

#[tokio::test]
async fn test_auto_mode_falls_back_to_generic_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="/novostroyki">Все новостройки</a><a href="https://other.example/">Партнёры</a>"#,
        1,
    )
    .await;
    mount_page(
        &server,
        "/novostroyki",
        &format!(
            r#"{}<a href="/">Главная</a>"#,
            card("ЖК Рассвет", "/zhk/rassvet", "")
        ),
        1,
    )
    .await;

    let searcher = Searcher::new(config_without_enrichment(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::Matched);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.stats.gaps.get("no city list"), Some(&1));
}

#[tokio::test]
async fn test_auto_mode_matches_cards_on_root() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"{}<a href="/about">О проекте</a>"#,
            card("ЖК Рассвет", "/zhk/rassvet", "")
        ),
        1,
    )
    .await;
    mount_page(&server, "/about", "<p>О проекте</p>", 0).await;

    let searcher = Searcher::new(config_without_enrichment(&server)).unwrap();
    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.final_state, CrawlState::Matched);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.stats.pages_fetched, 1);
}

#[tokio::test]
async fn test_cities_mode_without_city_list_is_exhausted() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"{}<a href="/novostroyki">Все новостройки</a>"#,
            card("ЖК Рассвет", "/zhk/rassvet", "")
        ),
        1,
    )
    .await;
    mount_page(&server, "/novostroyki", "", 0).await;

    let mut config = config_for(&server);
    config.crawler.mode = CrawlMode::Cities;
    let searcher = Searcher::new(config).unwrap();

    let report = searcher.search("рассвет").await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.status, SearchStatus::NoMatchFound);
    assert_eq!(report.final_state, CrawlState::Exhausted);
}

#[tokio::test]
async fn test_generic_mode_ignores_city_list() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"{}<a href="/catalog">Каталог</a>"#,
            city_list(&[("Краснодар", "/krasnodar")])
        ),
        1,
    )
    .await;
    // Reached as a generic page: its links are followed too
    mount_page(
        &server,
        "/krasnodar",
        r#"<a href="/krasnodar/zhk">Жилые комплексы</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/catalog", "<p>Каталог пуст</p>", 1).await;
    mount_page(
        &server,
        "/krasnodar/zhk",
        &card("ЖК Рассвет", "/zhk/rassvet", ""),
        1,
    )
    .await;

    let mut config = config_without_enrichment(&server);
    config.crawler.mode = CrawlMode::Generic;
    let searcher = Searcher::new(config).unwrap();

    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::Matched);
    assert_eq!(report.records[0].title, "ЖК Рассвет");
    assert_eq!(report.stats.pages_fetched, 4);
}

#[tokio::test]
async fn test_parallel_fetches_respect_page_cap() {
    let server = MockServer::start().await;

    let cities: Vec<(String, String)> = (1..=10)
        .map(|n| (format!("Город {}", n), format!("/city-{}", n)))
        .collect();
    let city_refs: Vec<(&str, &str)> = cities
        .iter()
        .map(|(name, href)| (name.as_str(), href.as_str()))
        .collect();
    mount_page(&server, "/", &city_list(&city_refs), 1).await;

    for n in 1..=10 {
        let times = if n <= 5 { 1 } else { 0 };
        mount_page(
            &server,
            &format!("/city-{}", n),
            &card(&format!("ЖК Город-{}", n), &format!("/zhk/{}", n), ""),
            times,
        )
        .await;
    }

    let mut config = config_for(&server);
    config.crawler.max_concurrent_fetches = 4;
    config.crawler.page_cap = 6;
    let searcher = Searcher::new(config).unwrap();

    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.status, SearchStatus::CrawlBudgetExhausted);
    assert_eq!(report.final_state, CrawlState::Capped);
    assert_eq!(report.stats.pages_fetched, 6);
    assert_eq!(server.received_requests().await.unwrap().len(), 6);
}

#[tokio::test]
async fn test_parallel_results_merged_in_queue_order() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &city_list(&[("Краснодар", "/krasnodar"), ("Сочи", "/sochi")]),
        1,
    )
    .await;
    // The first city answers last; its match must still win
    Mock::given(method("GET"))
        .and(path("/krasnodar"))
        .respond_with(
            html(&card("ЖК Рассвет", "/zhk/rassvet", ""))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/sochi", &card("ЖК Рассвет у моря", "/zhk/sea", ""), 1).await;

    let mut config = config_without_enrichment(&server);
    config.crawler.max_concurrent_fetches = 2;
    let searcher = Searcher::new(config).unwrap();

    let report = searcher.search("рассвет").await.unwrap();

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title, "ЖК Рассвет");
    assert_eq!(report.stats.pages_fetched, 3);
}

#[tokio::test]
async fn test_concurrent_searches_share_searcher() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&city_list(&[("Краснодар", "/krasnodar")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/krasnodar"))
        .respond_with(html(&format!(
            "{}{}",
            card("ЖК Рассвет", "/zhk/rassvet", ""),
            card("ЖК Закат", "/zhk/zakat", "")
        )))
        .mount(&server)
        .await;

    let searcher = std::sync::Arc::new(Searcher::new(config_without_enrichment(&server)).unwrap());

    let (dawn, dusk) = tokio::join!(searcher.search("рассвет"), searcher.search("закат"));

    assert_eq!(dawn.unwrap().records[0].title, "ЖК Рассвет");
    assert_eq!(dusk.unwrap().records[0].title, "ЖК Закат");
}
