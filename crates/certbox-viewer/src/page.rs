//! Page access and mounting.

use certbox_core::CertificateRecord;
use certbox_render::{escape_html, RenderedMarkup};

use crate::error::{FailureKind, ViewerError};
use crate::pipeline::RenderedCertificate;

/// Read access to the page hosting the viewer.
pub trait PageContext {
    /// Address fragment without the leading `#`, if the address has one.
    fn fragment(&self) -> Option<String>;

    /// Sealed certificate embedded in the page.
    fn embedded_certificate(&self) -> Option<CertificateRecord>;

    /// Registry id of the certificate the page shows.
    fn certificate_id(&self) -> Option<String>;
}

/// Element that displays the viewer output.
pub trait MountTarget {
    /// Replaces the element content with `markup`.
    fn set_inner_html(&mut self, markup: &str);
}

/// In-memory page built from an address and optional embedded data.
#[derive(Clone, Debug)]
pub struct StaticPage {
    url: String,
    certificate_id: Option<String>,
    certificate: Option<CertificateRecord>,
}

impl StaticPage {
    /// Creates a page for `url`, e.g. `https://host/7#<key hex>`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            certificate_id: None,
            certificate: None,
        }
    }

    /// Embeds a sealed certificate in the page.
    pub fn with_certificate(mut self, record: CertificateRecord) -> Self {
        self.certificate = Some(record);
        self
    }

    /// Overrides the certificate id otherwise taken from the address path.
    pub fn with_certificate_id(mut self, certificate_id: impl Into<String>) -> Self {
        self.certificate_id = Some(certificate_id.into());
        self
    }

    /// The page address.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn path(&self) -> &str {
        let before_fragment = self.url.split('#').next().unwrap_or_default();
        before_fragment.split('?').next().unwrap_or_default()
    }
}

impl PageContext for StaticPage {
    fn fragment(&self) -> Option<String> {
        self.url
            .split_once('#')
            .map(|(_, fragment)| fragment.to_owned())
    }

    fn embedded_certificate(&self) -> Option<CertificateRecord> {
        self.certificate.clone()
    }

    fn certificate_id(&self) -> Option<String> {
        if let Some(id) = &self.certificate_id {
            return Some(id.clone());
        }
        // Registry pages live at `/<numeric id>`.
        let last = self.path().trim_end_matches('/').rsplit('/').next()?;
        (!last.is_empty() && last.bytes().all(|b| b.is_ascii_digit())).then(|| last.to_owned())
    }
}

/// Mount element that keeps its content in memory.
#[derive(Clone, Debug, Default)]
pub struct MountBuffer {
    inner_html: String,
    paints: usize,
}

impl MountBuffer {
    /// Current content.
    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// Number of times content was set.
    pub fn paints(&self) -> usize {
        self.paints
    }
}

impl MountTarget for MountBuffer {
    fn set_inner_html(&mut self, markup: &str) {
        self.inner_html.clear();
        self.inner_html.push_str(markup);
        self.paints += 1;
    }
}

/// User-facing markup for a failed run.
///
/// Messages are fixed per failure class; error details stay in the logs.
pub fn error_page(err: &ViewerError) -> RenderedMarkup {
    let (title, hint) = match err.kind() {
        FailureKind::KeyAcquisition => (
            "Missing certificate key",
            "Open the full certificate link, including the part after #.",
        ),
        FailureKind::Decryption => (
            "Certificate could not be decrypted",
            "The key in the link does not match this certificate or the certificate was altered.",
        ),
        FailureKind::Template => (
            "Certificate template could not be rendered",
            "The certificate template is invalid.",
        ),
        FailureKind::Fetch => (
            "Certificate could not be loaded",
            "The certificate registry is unreachable. Try again later.",
        ),
        FailureKind::MissingCertificate => (
            "Invalid certificate link",
            "This page does not reference a certificate.",
        ),
        FailureKind::InvalidCertificateId => (
            "Invalid certificate ID",
            "Certificate ids are whole numbers.",
        ),
        FailureKind::NotFound => (
            "Certificate Not Found",
            "No certificate exists under this id.",
        ),
        FailureKind::Cancelled => ("Loading cancelled", "The certificate was not loaded."),
        FailureKind::AlreadyRan => ("Certificate already shown", "Reload the page to retry."),
    };
    RenderedMarkup::from_trusted(format!(
        "<h1>{}</h1><p>{}</p><p>Go to the <a href=\"/\">home page</a></p>",
        escape_html(title),
        escape_html(hint)
    ))
}

/// Mounts the run result: the certificate markup or the error page.
pub fn mount_outcome<M: MountTarget + ?Sized>(
    outcome: &Result<RenderedCertificate, ViewerError>,
    mount: &mut M,
) {
    match outcome {
        Ok(rendered) => mount.set_inner_html(rendered.markup.as_str()),
        Err(err) => mount.set_inner_html(error_page(err).as_str()),
    }
}

/// Full HTML document with `markup` inside the `app` mount element.
pub fn page_shell(title: &str, markup: &RenderedMarkup) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>{}</title>\n</head>\n<body>\n<div id=\"app\">{}</div>\n</body>\n</html>\n",
        escape_html(title),
        markup
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use certbox_core::KeyError;

    #[test]
    fn fragment_split_at_first_hash() {
        let page = StaticPage::new("https://cert.example/3?x=1#abcd#ef");
        assert_eq!(page.fragment().as_deref(), Some("abcd#ef"));
        assert_eq!(StaticPage::new("https://cert.example/3").fragment(), None);
        assert_eq!(
            StaticPage::new("https://cert.example/3#").fragment().as_deref(),
            Some("")
        );
    }

    #[test]
    fn certificate_id_from_path() {
        assert_eq!(
            StaticPage::new("https://cert.example/42#00").certificate_id().as_deref(),
            Some("42")
        );
        assert_eq!(
            StaticPage::new("https://cert.example/42/?q=1").certificate_id().as_deref(),
            Some("42")
        );
        assert_eq!(StaticPage::new("https://cert.example/").certificate_id(), None);
        assert_eq!(StaticPage::new("https://cert.example/abc").certificate_id(), None);
        assert_eq!(
            StaticPage::new("https://cert.example/abc")
                .with_certificate_id("9")
                .certificate_id()
                .as_deref(),
            Some("9")
        );
    }

    #[test]
    fn error_page_has_fixed_message() {
        let markup = error_page(&ViewerError::KeyAcquisition(KeyError::MissingFragment));
        assert!(markup.as_str().starts_with("<h1>Missing certificate key</h1>"));
        let markup = error_page(&ViewerError::NotFound("<7>".into()));
        assert!(markup.as_str().contains("Certificate Not Found"));
        assert!(!markup.as_str().contains("<7>"));
        let markup = error_page(&ViewerError::Template(
            certbox_render::TemplateError::MissingTemplate,
        ));
        assert!(markup
            .as_str()
            .starts_with("<h1>Certificate template could not be rendered</h1>"));
    }

    #[test]
    fn mount_outcome_shows_error_page() {
        let mut mount = MountBuffer::default();
        mount_outcome(&Err(ViewerError::Cancelled), &mut mount);
        assert!(mount.inner_html().contains("Loading cancelled"));
        assert_eq!(mount.paints(), 1);
    }

    #[test]
    fn shell_wraps_markup_in_app_element() {
        let markup = RenderedMarkup::from_trusted("<p>ok</p>".into());
        let html = page_shell("A & B", &markup);
        assert!(html.contains("<div id=\"app\"><p>ok</p></div>"));
        assert!(html.contains("<title>A &amp; B</title>"));
    }
}
