//! File-based runs of the subcommand handlers.

use std::path::{Path, PathBuf};

use bpe_cli::event::{run_event, EventArgs, EventCommand, EventCommon};
use bpe_cli::make::{load_ticket, run_make, run_qrcode, MakeArgs, QrcodeArgs};
use bpe_cli::protocol::{run_authorize, run_cancel_register, AuthorizeArgs, CancelRegisterArgs};
use bpe_core::XmlDocument;

const TICKET: &str = r#"
infBPe: { versao: "1.00" }
ide:
  cUF: 43
  tpAmb: 2
  mod: 63
  serie: 5
  nBP: 987654
  cBP: 11223344
  cDV: 0
  modal: 1
  dhEmi: "2023-07-31T23:30:00-03:00"
  tpEmis: 1
  verProc: cli-test
  tpBPe: 0
  indPres: 1
  UFIni: RS
  cMunIni: 4314902
  UFFim: SC
  cMunFim: 4205407
emit:
  CNPJ: "98765432000198"
  IE: "0960000001"
  xNome: Transportes Sul
  IM: 1
  CNAE: 4922101
  CRT: 3
enderEmit: { xLgr: Av B, nro: 1, xBairro: Centro, cMun: 4314902, xMun: Porto Alegre, UF: RS }
infPassagem: { cLocOrig: 1, xLocOrig: POA, cLocDest: 2, xLocDest: FLN, dhEmb: "2023-08-01T08:00:00-03:00", dhValidade: "2024-07-31T23:59:59-03:00" }
infViagem: { cPercurso: 7, xPercurso: POA-FLN, tpViagem: "00", tpServ: 1, tpAcomodacao: 1, tpTrecho: 1, dhViagem: "2023-08-01T08:00:00-03:00" }
infValorBPe: { vBP: "150.00", vDesconto: "0.00", vPgto: "150.00", vTroco: "0.00" }
ICMS: { CST: 40 }
pag:
  - { tPag: 17, vPag: "150.00" }
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn sign(xml: &str, digest: &str) -> String {
    bpe_core::strings::strip_declaration(xml).replace(
        "</BPe>",
        &format!(
            r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo><DigestValue>{digest}</DigestValue></SignedInfo><SignatureValue>c2ln</SignatureValue></Signature></BPe>"#
        ),
    )
}

fn make(dir: &Path) -> (String, String) {
    let input = write(dir, "ticket.yaml", TICKET);
    let out = dir.join("ticket.xml");
    let code = run_make(&MakeArgs {
        input,
        out: Some(out.clone()),
    })
    .unwrap();
    assert_eq!(code, 0);
    let xml = read(&out);
    let doc = XmlDocument::parse(xml.as_str()).unwrap();
    let id = doc.find("infBPe").unwrap().attr("Id").unwrap().to_string();
    (xml, id.trim_start_matches("BPe").to_string())
}

#[test]
fn unquoted_scalars_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "ticket.yaml", TICKET);
    let input = load_ticket(&path).unwrap();
    let ide = input.ide.unwrap();
    assert_eq!(ide.uf_code.as_deref(), Some("43"));
    assert_eq!(ide.number.as_deref(), Some("987654"));
}

#[test]
fn json_ticket() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "ticket.json",
        r#"{"infBPe": {"versao": "1.00"}, "ICMS": {"CST": 40}, "pag": [{"tPag": 1, "vPag": "1.00"}]}"#,
    );
    let input = load_ticket(&path).unwrap();
    assert_eq!(input.payments.len(), 1);
    assert_eq!(input.payments[0].method.as_deref(), Some("1"));
}

#[test]
fn make_reports_missing_group() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "bad.yaml", "infBPe: { versao: \"1.00\" }\n");
    let err = run_make(&MakeArgs { input, out: None }).unwrap_err();
    assert!(format!("{err:#}").contains("cannot assemble"));
}

#[test]
fn sign_qrcode_authorize_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let (xml, key) = make(dir.path());
    assert_eq!(key.len(), 44);
    assert!(key.starts_with("432307"));

    let signed = write(dir.path(), "signed.xml", &sign(&xml, "ZGln"));
    let with_qr = dir.path().join("signed-qr.xml");
    run_qrcode(
        &QrcodeArgs {
            signed,
            url: Some("https://example.test/qr".to_string()),
            out: Some(with_qr.clone()),
        },
        None,
    )
    .unwrap();
    let signed_qr = read(&with_qr);
    assert!(signed_qr.contains(&format!(
        "<qrCodBPe><![CDATA[https://example.test/qr?chBPe={key}&tpAmb=2]]></qrCodBPe>"
    )));

    let response = write(
        dir.path(),
        "ret.xml",
        &format!(
            r#"<retBPe versao="1.00"><protBPe versao="1.00"><infProt><chBPe>{key}</chBPe><nProt>143230000000001</nProt><digVal>ZGln</digVal><cStat>100</cStat><xMotivo>Autorizado o uso do BP-e</xMotivo></infProt></protBPe></retBPe>"#
        ),
    );
    let proc_path = dir.path().join("proc.xml");
    run_authorize(&AuthorizeArgs {
        request: with_qr.clone(),
        response,
        out: Some(proc_path.clone()),
    })
    .unwrap();
    let proc = read(&proc_path);
    assert!(proc.contains(&signed_qr));

    let unrelated = write(dir.path(), "ev1.xml", "<retEnvEvento/>");
    let canceled = write(
        dir.path(),
        "ev2.xml",
        &format!(
            r#"<retEventoBPe versao="1.00"><infEvento><cStat>135</cStat><xMotivo>ok</xMotivo><chBPe>{key}</chBPe><tpEvento>110111</tpEvento><nProt>143230000000777</nProt></infEvento></retEventoBPe>"#
        ),
    );
    let out = dir.path().join("proc-canceled.xml");
    run_cancel_register(&CancelRegisterArgs {
        authorized: proc_path,
        events: vec![unrelated, canceled],
        out: Some(out.clone()),
    })
    .unwrap();
    let doc_text = read(&out);
    let doc = XmlDocument::parse(doc_text.as_str()).unwrap();
    let inf = doc.find("infProt").unwrap();
    assert_eq!(inf.child_text("cStat"), Some("101"));
    assert_eq!(inf.child_text("nProt"), Some("143230000000777"));
}

#[test]
fn authorize_rejection_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let (xml, key) = make(dir.path());
    let request = write(dir.path(), "signed.xml", &sign(&xml, "ZGln"));
    let response = write(
        dir.path(),
        "ret.xml",
        &format!(
            r#"<protBPe><infProt><chBPe>{key}</chBPe><digVal>ZGln</digVal><cStat>539</cStat><xMotivo>Duplicidade</xMotivo></infProt></protBPe>"#
        ),
    );
    let err = run_authorize(&AuthorizeArgs {
        request,
        response,
        out: None,
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("[539] Duplicidade"));
}

fn event_args(key: &str, out: PathBuf) -> EventArgs {
    EventArgs {
        command: EventCommand::Cancel {
            common: EventCommon {
                key: key.to_string(),
                protocol: "143230000000001".to_string(),
                sequence: 1,
                at: Some("2023-08-01T09:00:00-03:00".to_string()),
                out: Some(out),
            },
            justification: "Viagem cancelada pelo passageiro".to_string(),
        },
    }
}

#[test]
fn event_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let (_, key) = make(dir.path());
    let config = write(dir.path(), "bpe.yaml", "uf: RS\ncnpj: \"98765432000198\"\n");
    let out = dir.path().join("event.xml");
    run_event(&event_args(&key, out.clone()), Some(&config)).unwrap();

    let xml = read(&out);
    let doc = XmlDocument::parse(xml.as_str()).unwrap();
    let inf = doc.find("infEvento").unwrap();
    assert_eq!(inf.attr("Id"), Some(format!("ID110111{key}01").as_str()));
    assert_eq!(inf.child_text("cOrgao"), Some("43"));
    assert_eq!(inf.child_text("dhEvento"), Some("2023-08-01T09:00:00-03:00"));
}

#[test]
fn event_for_other_uf_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (_, key) = make(dir.path());
    let config = write(dir.path(), "bpe.yaml", "uf: SP\ncnpj: \"98765432000198\"\n");
    let out = dir.path().join("event.xml");
    assert!(run_event(&event_args(&key, out.clone()), Some(&config)).is_err());
    assert!(!out.exists());
}
