//! End-to-end wizard flow over the on-disk stores.

use enrol_core::documents::reconcile;
use enrol_core::{
    BlobStore, DocumentBundle, DocumentSlot, FileKvStore, PreviewResolver, PreviewSource,
    RedbBlobStore, Section, SectionRecord, Step, StepOutcome, StoredDocument, WizardSession,
    validate_all,
};
use tempfile::tempdir;

fn fill_all_text_sections(session: &mut WizardSession<FileKvStore>) {
    let steps = [
        (
            Section::Personal,
            SectionRecord::new()
                .with("firstName", "Ama")
                .with("lastName", "Owusu")
                .with("gender", "Female")
                .with("dateOfBirth", "2012-03-14")
                .with("nationality", "Ghanaian")
                .with("address", "5 Palm St, Kumasi")
                .with("phoneNumber", "0551234567")
                .with("email", "ama@example.com"),
        ),
        (
            Section::Guardian,
            SectionRecord::new()
                .with("fullName", "Kwame Owusu")
                .with("relationship", "Father")
                .with("occupation", "Teacher")
                .with("nationality", "Ghanaian")
                .with("phoneNumber", "0241234567")
                .with("emergencyNumber", "0201234567")
                .with("address", "5 Palm St, Kumasi"),
        ),
        (
            Section::Academic,
            SectionRecord::new()
                .with("schoolName", "Kumasi Basic")
                .with("schoolAddress", "Box 4, Kumasi")
                .with("startDate", "2018-09-01")
                .with("endDate", "2024-07-31")
                .with("classCompleted", "JHS-3"),
        ),
        (
            Section::Health,
            SectionRecord::new()
                .with("bloodGroup", "O+")
                .with("genotype", "AA"),
        ),
    ];

    for (section, record) in steps {
        let outcome = session.save_section(section, &record).expect("save");
        assert!(matches!(outcome, StepOutcome::Advanced(_)), "{section}: {outcome:?}");
    }
}

#[test]
fn full_flow_survives_restart() {
    let temp = tempdir().expect("temp dir");
    let blobs = RedbBlobStore::open(temp.path().join("documents.redb")).expect("open blobs");

    {
        let mut session =
            WizardSession::open(FileKvStore::open(temp.path().join("state")).expect("open kv"));
        fill_all_text_sections(&mut session);
        assert_eq!(session.navigator().current(), Step::Documents);

        let mut bundle = DocumentBundle::new();
        for slot in [
            DocumentSlot::PassportPhoto,
            DocumentSlot::BirthCertificate,
            DocumentSlot::TerminalResult,
        ] {
            let name = if slot == DocumentSlot::PassportPhoto { "me.png" } else { "doc.pdf" };
            let document = StoredDocument::new(slot, name, vec![1, 2, 3]).expect("document");
            bundle.insert(slot, document.clone());
            blobs.save_bundle(&bundle).expect("save blobs");
            session.record_document(slot, &document).expect("record");
        }

        let outcome = session
            .save_section(Section::Documents, &SectionRecord::new())
            .expect("save documents");
        assert_eq!(outcome, StepOutcome::Advanced(Step::Review));
    }

    // Restart: everything comes back from disk.
    let session =
        WizardSession::open(FileKvStore::open(temp.path().join("state")).expect("reopen kv"));
    assert_eq!(session.navigator().current(), Step::Review);
    assert!(!session.review().has_missing);

    // The durable aggregate holds names only, never bytes.
    let raw = std::fs::read_to_string(temp.path().join("state").join("formData.json"))
        .expect("read record");
    assert!(raw.contains("\"passportPhoto\":\"me.png\""));
    assert!(!raw.contains("base64"));

    let bundle = blobs.load_bundle().expect("load").expect("bundle");
    let resolver = PreviewResolver::new();
    let (_, source) = resolver
        .resolve(DocumentSlot::BirthCertificate, Some(&bundle))
        .expect("preview");
    assert_eq!(source, PreviewSource::Durable);
}

#[test]
fn lost_blob_counts_as_missing_document() {
    let temp = tempdir().expect("temp dir");
    let mut session =
        WizardSession::open(FileKvStore::open(temp.path()).expect("open kv"));
    fill_all_text_sections(&mut session);

    let photo =
        StoredDocument::new(DocumentSlot::PassportPhoto, "me.png", vec![1]).expect("document");
    session
        .record_document(DocumentSlot::PassportPhoto, &photo)
        .expect("record");

    // No blob was ever saved for the photo.
    let mut form = session.form().clone();
    form.documents = reconcile(&form.documents, None);

    let report = validate_all(&form);
    assert!(
        report.missing_by_section[&Section::Documents].contains(&"Passport Photograph".to_string())
    );
}

#[test]
fn edit_round_trip_from_review() {
    let temp = tempdir().expect("temp dir");
    let mut session =
        WizardSession::open(FileKvStore::open(temp.path()).expect("open kv"));
    fill_all_text_sections(&mut session);

    // Review is still locked: no documents yet.
    assert!(session.begin_edit(Section::Academic).is_err());

    for (slot, name) in [
        (DocumentSlot::PassportPhoto, "me.png"),
        (DocumentSlot::BirthCertificate, "birth.pdf"),
        (DocumentSlot::TerminalResult, "result.pdf"),
    ] {
        let document = StoredDocument::new(slot, name, vec![7]).expect("document");
        session.record_document(slot, &document).expect("record");
    }
    session.begin_edit(Section::Academic).expect("edit");
    let outcome = session
        .save_section(
            Section::Academic,
            &SectionRecord::new().with("endDate", "2024-06-30"),
        )
        .expect("save");

    assert_eq!(outcome, StepOutcome::Advanced(Step::Review));
    assert!(!session.navigator().is_editing());
    assert_eq!(session.form().academic.get("endDate"), Some("2024-06-30"));
}
