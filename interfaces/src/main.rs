use interfaces::baseline::BaselineAnalysisProvider;
use interfaces::defs::AnalysisProvider;
use interfaces::defs::AnalysisRequest;
use interfaces::defs::InputReference;
use interfaces::defs::UploadedBlob;
use interfaces::empty::EmptyAnalysisProvider;

use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let remote = InputReference::RemoteLocator {
        url: "https://example.com/offer-letter.pdf".to_owned(),
    };
    let upload = InputReference::UploadedBlob(Arc::new(UploadedBlob::new(
        b"%PDF-1.7 sample".to_vec(),
        "application/pdf",
        "offer-letter.pdf",
    )));

    let baseline = BaselineAnalysisProvider::default();
    for reference in [&remote, &upload] {
        let request = AnalysisRequest::snapshot(reference)
            .ok_or_else(|| anyhow::anyhow!("nothing to analyze"))?;
        let result = baseline.analyze(&request).await?;
        println!("{} -> {}", reference, serde_json::to_string_pretty(&result)?);
    }

    let request = AnalysisRequest::snapshot(&remote)
        .ok_or_else(|| anyhow::anyhow!("nothing to analyze"))?;
    let empty = EmptyAnalysisProvider.analyze(&request).await?;
    println!("empty: {:#?}", &empty);
    Ok(())
}
