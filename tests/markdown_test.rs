//! Markdown conversion and cleaning on whole documents.

use markscrape::markdown::{html_to_markdown, ImageAccumulator};
use markscrape::text_cleaning::{clean_content, extract_images_from_markdown};
use url::Url;

const DOCUMENT: &str = r#"<html><body>
    <h1>Release   notes</h1>
    <p>Version <strong>2.0</strong> adds a [bracketed] flag and <a href="changelog#v2" title="Full log">the changelog</a>.</p>
    <figure><img src="img/shot one.png" alt="Screenshot [new]" title="The &quot;new&quot; UI"></figure>
    <ul>
        <li>Faster  startup</li>
        <li>New <code>--dry_run</code> flag
            <ol><li>Prints the plan</li><li>Exits</li></ol>
        </li>
    </ul>
    <pre><code class="lang-sh">$ tool   --dry_run
  planned: 3 steps</code></pre>
    <blockquote><p>It works ,  really !!</p></blockquote>
    <p><img data-src="/lazy.jpg" alt="Lazy"> <img src="data:image/png;base64,AAAA" alt="inline"></p>
    <table><tr><th>Flag</th><th>Effect</th></tr><tr><td>-n</td><td>dry run</td></tr></table>
</body></html>"#;

fn convert() -> (String, ImageAccumulator) {
    let base = Url::parse("https://example.com/docs/").expect("valid url");
    let mut images = ImageAccumulator::new();
    let markdown = html_to_markdown(DOCUMENT, Some(&base), &mut images);
    (markdown, images)
}

#[test]
fn document_converts_block_by_block() {
    let (markdown, _) = convert();

    assert!(markdown.starts_with("# Release notes\n\n"));
    assert!(markdown.contains(r"adds a \[bracketed\] flag"));
    assert!(markdown.contains(r#"[the changelog](https://example.com/docs/changelog#v2 "Full log")"#));
    assert!(markdown.contains("- Faster startup\n- New `--dry_run` flag\n  1. Prints the plan\n  2. Exits"));
    assert!(markdown.contains("```sh\n$ tool   --dry_run\n  planned: 3 steps\n```"));
    assert!(markdown.contains("| Flag | Effect  |\n| ---- | ------- |\n| -n   | dry run |"));
    assert!(!markdown.contains("base64"));
}

#[test]
fn image_accumulator_agrees_with_markdown_scan() {
    let (markdown, images) = convert();
    let scanned = extract_images_from_markdown(&markdown);

    assert_eq!(images.len(), 2);
    assert_eq!(scanned.len(), images.len());
    for (found, kept) in scanned.iter().zip(images.images()) {
        assert_eq!(found.src, kept.src);
        assert_eq!(found.alt, kept.alt);
        assert_eq!(found.title, kept.title);
        assert_eq!(found.index, kept.index);
    }
    assert_eq!(images.images()[0].src, "https://example.com/docs/img/shot%20one.png");
    assert_eq!(images.images()[0].alt, "Screenshot [new]");
    assert_eq!(images.images()[1].src, "https://example.com/lazy.jpg");
}

#[test]
fn literal_backticks_do_not_hide_images() {
    let html = r#"<p>Press the ` key then see <img src="a.png" alt="A"></p><p><img src="b.png" alt="x`y"></p>"#;
    let mut images = ImageAccumulator::new();
    let markdown = html_to_markdown(html, None, &mut images);
    let scanned = extract_images_from_markdown(&markdown);

    assert_eq!(images.len(), 2);
    assert_eq!(scanned.len(), images.len());
    assert_eq!(scanned[1].alt, "x`y");
    assert_eq!(extract_images_from_markdown(&clean_content(&markdown)).len(), 2);
}

#[test]
fn cleaning_is_idempotent_and_keeps_code() {
    let (markdown, _) = convert();
    let once = clean_content(&markdown);
    let twice = clean_content(&once);

    assert_eq!(once, twice);
    assert!(once.contains("> It works, really!"));
    assert!(once.contains("$ tool   --dry_run"));
    assert!(once.starts_with("# Release notes"));
}

#[test]
fn cleaning_normalizes_typography_outside_code() {
    let raw = "“Quoted”   text ,  here\u{200B} !!\n\n\n\nNext\u{a0}line\t end   \n\n`a  ,  b`";
    assert_eq!(clean_content(raw), "\"Quoted\" text, here!\n\nNext line end\n\n`a  ,  b`");
}
