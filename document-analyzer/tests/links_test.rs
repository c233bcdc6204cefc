use document_analyzer::links::{canonicalize, embed_url, video_id};

#[test]
fn test_short_link() {
    let reference = canonicalize("https://youtu.be/dQw4w9WgXcQ").expect("short link is recognized");

    assert_eq!(reference.video_id, "dQw4w9WgXcQ");
    assert_eq!(reference.embed_url, "https://www.youtube.com/embed/dQw4w9WgXcQ");
    assert_eq!(reference.source_url, "https://youtu.be/dQw4w9WgXcQ");
}

#[test]
fn test_long_form_ignores_extra_parameters() {
    let reference = canonicalize("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=30")
        .expect("watch link is recognized");
    assert_eq!(reference.video_id, "dQw4w9WgXcQ");
    assert_eq!(reference.embed_url, "https://www.youtube.com/embed/dQw4w9WgXcQ");

    // Parameter order and subdomain do not matter
    assert_eq!(
        video_id("https://youtube.com/watch?list=PL123&v=JdsB9QQLeVA").as_deref(),
        Some("JdsB9QQLeVA")
    );
    assert_eq!(
        video_id("https://m.youtube.com/watch?v=AkS7ywlA9zc").as_deref(),
        Some("AkS7ywlA9zc")
    );
}

#[test]
fn test_short_link_uses_first_path_segment() {
    assert_eq!(
        video_id("https://youtu.be/dQw4w9WgXcQ/extra?si=share").as_deref(),
        Some("dQw4w9WgXcQ")
    );
    assert_eq!(canonicalize("https://youtu.be/"), None);
    assert_eq!(canonicalize("https://youtu.be"), None);
}

#[test]
fn test_unrecognized_input() {
    assert_eq!(canonicalize("https://example.com/video"), None);
    assert_eq!(canonicalize("not a url"), None);
    assert_eq!(canonicalize(""), None);
    assert_eq!(canonicalize("https://www.youtube.com/watch"), None, "Missing v parameter");
    assert_eq!(canonicalize("https://www.youtube.com/watch?v="), None, "Empty v parameter");
    assert_eq!(
        canonicalize("https://www.youtube.com/watch?v=%3Cscript%3E"),
        None,
        "Identifiers outside the token alphabet are rejected"
    );
}

#[test]
fn test_deterministic() {
    let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    assert_eq!(canonicalize(url), canonicalize(url));
    assert_eq!(embed_url(url), embed_url(url));
    assert_eq!(
        embed_url(url).as_deref(),
        Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
    );
}
