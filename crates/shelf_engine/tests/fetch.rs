use shelf_engine::{BrowserSession, FetchSettings, HtmlSession, HttpLoader, PageLoader, SessionError};
use wiremock::matchers::{headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn loader() -> HttpLoader {
    HttpLoader::new(FetchSettings::default()).expect("http client")
}

#[tokio::test]
async fn loads_html_as_a_single_frame() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product/p-1/"))
        .and(headers("accept-language", vec!["ru-RU", "ru;q=0.9", "en;q=0.6"]))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><h1>Mouse</h1></html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/product/p-1/", server.uri());
    let page = loader().load(&url).await.expect("page");

    assert_eq!(page.final_url, url);
    assert_eq!(page.frames, vec!["<html><h1>Mouse</h1></html>".to_string()]);
}

#[tokio::test]
async fn decodes_legacy_cyrillic_charset() {
    let server = MockServer::start().await;
    let (body, _, _) = encoding_rs::WINDOWS_1251.encode("<html><h1>Кофемолка</h1></html>");
    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.into_owned(), "text/html; charset=windows-1251"),
        )
        .mount(&server)
        .await;

    let mut session = HtmlSession::new(loader());
    session
        .navigate(&format!("{}/legacy", server.uri()))
        .await
        .unwrap();

    let titles = session.find_all("h1").await.unwrap();
    assert_eq!(session.text(&titles[0]).await.unwrap(), "Кофемолка");
}

#[tokio::test]
async fn http_error_status_is_a_navigation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = loader()
        .load(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();

    match err {
        SessionError::Navigation { message, .. } => assert_eq!(message, "http status 404"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "image/png"))
        .mount(&server)
        .await;

    let err = loader()
        .load(&format!("{}/image", server.uri()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("unsupported content type image/png"));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![b'a'; 2048], "text/html"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 1024,
        ..FetchSettings::default()
    };
    let err = HttpLoader::new(settings)
        .unwrap()
        .load(&format!("{}/huge", server.uri()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("response too large"));
}

#[tokio::test]
async fn malformed_url_never_reaches_the_network() {
    let err = loader().load("not a url").await.unwrap_err();
    assert!(matches!(err, SessionError::Navigation { .. }));
}
