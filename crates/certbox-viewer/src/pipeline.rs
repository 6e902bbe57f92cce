//! The decrypt-then-render state machine.

use certbox_core::{CertificateRecord, CertificateStatus, DecryptionKey, KeyError};
use certbox_render::{RenderedMarkup, Renderer};
use tokio_util::sync::CancellationToken;

use crate::error::{FailureKind, ViewerError};
use crate::fetch::{CertificateFetcher, FetchError};
use crate::page::PageContext;

/// Pipeline position.
///
/// `Idle → Acquiring → Decrypting → Rendering → Rendered`, or `Failed` from
/// any stage. `Rendered` and `Failed` are terminal until [`Pipeline::reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing attempted yet.
    Idle,
    /// Reading the key and obtaining the sealed certificate.
    Acquiring,
    /// Opening the secretbox.
    Decrypting,
    /// Evaluating the template.
    Rendering,
    /// Markup produced.
    Rendered,
    /// A stage failed.
    Failed(FailureKind),
}

/// Successful run output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedCertificate {
    /// Markup for the mount element.
    pub markup: RenderedMarkup,
    /// Issuer-assigned status carried by the record, if any.
    pub status: Option<CertificateStatus>,
    /// Who the certificate was issued for, if the payload says.
    pub issued_for: Option<String>,
}

/// Runs one decrypt-then-render pass per page load.
#[derive(Debug)]
pub struct Pipeline {
    renderer: Renderer,
    state: PipelineState,
}

impl Pipeline {
    /// Creates an idle pipeline.
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            state: PipelineState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Returns to `Idle` so the pipeline may run again.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
    }

    /// Renders the certificate embedded in `page`.
    pub fn run<P: PageContext + ?Sized>(
        &mut self,
        page: &P,
    ) -> Result<RenderedCertificate, ViewerError> {
        self.begin()?;
        let outcome = self.run_embedded(page);
        self.finish(outcome)
    }

    /// Fetches the certificate `page` names, then renders it.
    ///
    /// The key is read before any request is made. Cancelling `token` while
    /// the fetch is in flight abandons it and fails with
    /// [`ViewerError::Cancelled`].
    pub async fn run_remote<P, F>(
        &mut self,
        page: &P,
        fetcher: &F,
        token: &CancellationToken,
    ) -> Result<RenderedCertificate, ViewerError>
    where
        P: PageContext + ?Sized,
        F: CertificateFetcher + ?Sized,
    {
        self.begin()?;
        let outcome = self.run_fetched(page, fetcher, token).await;
        self.finish(outcome)
    }

    fn begin(&mut self) -> Result<(), ViewerError> {
        if self.state != PipelineState::Idle {
            return Err(ViewerError::AlreadyRan);
        }
        self.state = PipelineState::Acquiring;
        Ok(())
    }

    fn run_embedded<P: PageContext + ?Sized>(
        &mut self,
        page: &P,
    ) -> Result<RenderedCertificate, ViewerError> {
        let key = acquire_key(page)?;
        let record = page
            .embedded_certificate()
            .ok_or(ViewerError::MissingCertificate)?;
        self.open_and_render(&key, &record)
    }

    async fn run_fetched<P, F>(
        &mut self,
        page: &P,
        fetcher: &F,
        token: &CancellationToken,
    ) -> Result<RenderedCertificate, ViewerError>
    where
        P: PageContext + ?Sized,
        F: CertificateFetcher + ?Sized,
    {
        let key = acquire_key(page)?;
        let certificate_id = page
            .certificate_id()
            .ok_or(ViewerError::MissingCertificateId)?;
        if certificate_id.parse::<u64>().is_err() {
            return Err(ViewerError::InvalidCertificateId(certificate_id));
        }

        let fetched = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ViewerError::Cancelled),
            fetched = fetcher.fetch(&certificate_id) => fetched,
        };
        let record = match fetched {
            Err(FetchError::InvalidCertificateId(id)) => {
                return Err(ViewerError::InvalidCertificateId(id))
            }
            fetched => fetched?.ok_or(ViewerError::NotFound(certificate_id))?,
        };
        self.open_and_render(&key, &record)
    }

    fn open_and_render(
        &mut self,
        key: &DecryptionKey,
        record: &CertificateRecord,
    ) -> Result<RenderedCertificate, ViewerError> {
        self.state = PipelineState::Decrypting;
        let data = record.decrypt(key)?;

        self.state = PipelineState::Rendering;
        let markup = self.renderer.render(&data)?;

        if let Some(reason) = record.revocation_reason() {
            tracing::warn!(reason, "rendering a revoked certificate");
        }
        Ok(RenderedCertificate {
            markup,
            status: record.status.clone(),
            issued_for: data.issued_for().map(str::to_owned),
        })
    }

    fn finish(
        &mut self,
        outcome: Result<RenderedCertificate, ViewerError>,
    ) -> Result<RenderedCertificate, ViewerError> {
        match &outcome {
            Ok(_) => {
                tracing::info!("certificate rendered");
                self.state = PipelineState::Rendered;
            }
            Err(err) => {
                tracing::warn!(stage = ?self.state, error = %err, "certificate viewer failed");
                self.state = PipelineState::Failed(err.kind());
            }
        }
        outcome
    }
}

fn acquire_key<P: PageContext + ?Sized>(page: &P) -> Result<DecryptionKey, KeyError> {
    let fragment = page.fragment().ok_or(KeyError::MissingFragment)?;
    DecryptionKey::from_fragment(&fragment)
}
