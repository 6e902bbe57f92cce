//! Seals a certificate, builds its viewer link and renders it back.

use certbox_core::{CertificateData, CertificateRecord, DecryptionKey, Nonce};
use certbox_render::Renderer;
use certbox_viewer::{mount_outcome, MountBuffer, Pipeline, StaticPage, ViewerConfig};

fn main() {
    // Fixed key and nonce so the output is reproducible.
    let key = DecryptionKey::from([0u8; 32]);
    let nonce = Nonce::from([1u8; 24]);
    let data = CertificateData::from_plaintext(
        br#"{"certificate_template":"Hello {{name}}","name":"Ana"}"#,
    )
    .unwrap();
    let record = CertificateRecord::seal(&data, &nonce, &key).unwrap();

    let config = ViewerConfig::default();
    let page = StaticPage::new(config.viewer_url(Some("0"), &key)).with_certificate(record);

    let outcome = Pipeline::new(Renderer::new()).run(&page);
    let mut mount = MountBuffer::default();
    mount_outcome(&outcome, &mut mount);
    assert_eq!(mount.inner_html(), "Hello Ana");

    println!("viewer link: {}", page.url());
    println!("rendered: {}", mount.inner_html());
}
