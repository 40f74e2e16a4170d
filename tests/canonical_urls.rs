// tests/canonical_urls.rs
use newsletter_harvester::canonical::{canonicalize, normalize, resolve_redirect};

#[test]
fn canonicalize_is_idempotent_over_messy_input() {
    let inputs = [
        "http://Example.COM/a/b/?utm_source=x&b=2&a=1#frag",
        "https://example.com/",
        "https://example.com/x?flag",
        "mailto:someone@example.com",
        "not a url at all",
        "",
    ];
    for raw in inputs {
        let once = canonicalize(raw);
        assert_eq!(canonicalize(&once), once, "idempotence failed for {raw:?}");
    }
}

#[test]
fn tracking_variants_share_one_canonical_form() {
    let variants = [
        "https://example.com/story?id=7&utm_source=tldr&utm_medium=email",
        "http://EXAMPLE.com/story?fbclid=abc&id=7",
        "https://example.com/story?id=7&gclid=xyz&mc_eid=123#section",
        "https://example.com/story/?id=7&mkt_tok=zzz",
    ];
    let first = canonicalize(variants[0]);
    for v in &variants[1..] {
        assert_eq!(canonicalize(v), first, "variant diverged: {v}");
    }
    assert_eq!(first, "https://example.com/story?id=7");
}

#[test]
fn non_url_strings_pass_through_without_panicking() {
    for s in ["not a url", "   ", "::::", "12345"] {
        assert_eq!(canonicalize(s), s);
        assert_eq!(resolve_redirect(s), s);
        assert_eq!(normalize(s), s);
    }
}

#[test]
fn known_redirect_shapes_resolve_to_the_destination() {
    // Percent-encoded destination in a path segment.
    assert_eq!(
        resolve_redirect(
            "https://tracking.tldrnewsletter.com/CL0/https:%2F%2Fnews.example%2Fpost/1/x/h"
        ),
        "https://news.example/post"
    );
    // Destination in a named query parameter.
    assert_eq!(
        resolve_redirect("https://go.mailhost.example/r?target=https%3A%2F%2Fnews.example%2Fa"),
        "https://news.example/a"
    );
    // Mail-platform redirect suffix host.
    assert_eq!(
        resolve_redirect("https://acme.list-manage.com/track/click?url=https%3A%2F%2Fnews.example%2Fb"),
        "https://news.example/b"
    );
}

#[test]
fn unknown_hosts_and_undecodable_wrappers_are_left_alone() {
    let plain = "https://news.example/post?url=https%3A%2F%2Fother.example";
    assert_eq!(resolve_redirect(plain), plain);

    let broken = "https://click.mailhost.example/r?target=notaurl";
    assert_eq!(resolve_redirect(broken), broken);
}

#[test]
fn normalize_resolves_then_canonicalizes() {
    let wrapped =
        "https://tracking.tldrnewsletter.com/CL0/http:%2F%2FNews.Example%2Fpost%2F%3Futm_source=tldr%26id=3/1/x/h";
    assert_eq!(normalize(wrapped), "https://news.example/post?id=3");
}
