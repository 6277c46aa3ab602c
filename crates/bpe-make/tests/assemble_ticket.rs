//! End-to-end assembly from a YAML ticket description.

use bpe_core::{DocumentKey, XmlDocument};
use bpe_make::{check_key, key_check::key_fields, put_qr_tag, AssemblyError, TicketAssembler, TicketInput};
use proptest::prelude::*;

const TICKET: &str = r#"
infBPe:
  versao: "1.00"
ide:
  cUF: "35"
  tpAmb: "2"
  mod: "63"
  serie: "1"
  nBP: "123"
  cBP: "45678901"
  cDV: "0"
  modal: "1"
  dhEmi: "2019-01-10T10:00:00-03:00"
  tpEmis: "1"
  verProc: "bpe-cli 0.1"
  tpBPe: "0"
  indPres: "1"
  UFIni: "SP"
  cMunIni: "3550308"
  UFFim: "RJ"
  cMunFim: "3304557"
emit:
  CNPJ: "12345678000195"
  IE: "123456789110"
  xNome: "Viação Exemplo & Filhos"
  IM: "12345"
  CNAE: "4922101"
  CRT: "3"
enderEmit:
  xLgr: "Rua A"
  nro: "100"
  xBairro: "Centro"
  cMun: "3550308"
  xMun: "Sao Paulo"
  UF: "SP"
infPassagem:
  cLocOrig: "1"
  xLocOrig: "Sao Paulo"
  cLocDest: "2"
  xLocDest: "Rio de Janeiro"
  dhEmb: "2019-01-11T08:00:00-03:00"
  dhValidade: "2019-12-31T23:59:59-03:00"
infPassageiro:
  xNome: "Maria"
  CPF: "12345678909"
infViagem:
  cPercurso: "10"
  xPercurso: "SP-RJ"
  tpViagem: "00"
  tpServ: "1"
  tpAcomodacao: "1"
  tpTrecho: "1"
  dhViagem: "2019-01-11T08:00:00-03:00"
  poltrona: "12"
infValorBPe:
  vBP: "100.00"
  vDesconto: "0.00"
  vPgto: "100.00"
  vTroco: "0.00"
Comp:
  - tpComp: "01"
    vComp: "100.00"
imp:
  vTotTrib: "12.00"
ICMS:
  CST: "SN"
pag:
  - tPag: "01"
    vPag: "100.00"
"#;

fn input() -> TicketInput {
    serde_yaml::from_str(TICKET).unwrap()
}

#[test]
fn yaml_ticket_assembles() {
    let (xml, key) = TicketAssembler::assemble(&input()).unwrap();
    assert_eq!(key.as_str(), "35190112345678000195630010000001231456789013");

    let doc = XmlDocument::parse(xml.as_str()).unwrap();
    assert_eq!(doc.root().name(), "BPe");
    let inf = doc.find("infBPe").unwrap();
    assert_eq!(inf.attr("Id"), Some(format!("BPe{key}").as_str()));
    assert_eq!(inf.attr("versao"), Some("1.00"));
    assert_eq!(doc.find("cDV").unwrap().text(), "3");
    assert_eq!(doc.find("ICMSSN").unwrap().child_text("indSN"), Some("1"));
    // Issuer name is written as given; only free-text notes are sanitized.
    assert_eq!(
        doc.find("emit").unwrap().child_text("xNome"),
        Some("Viação Exemplo & Filhos")
    );

    let names: Vec<&str> = inf.children().iter().map(|c| c.name()).collect();
    assert_eq!(
        names,
        vec!["ide", "emit", "infPassagem", "infViagem", "infValorBPe", "imp", "pag"]
    );
}

#[test]
fn key_rederived_from_output_is_stable() {
    let (xml, key) = TicketAssembler::assemble(&input()).unwrap();
    let doc = XmlDocument::parse(xml).unwrap();
    let ide = doc.find("ide").unwrap();
    let again = bpe_core::KeyFields {
        uf_code: ide.child_text("cUF").unwrap().parse().unwrap(),
        year: 19,
        month: 1,
        tax_id: doc.find("emit").unwrap().child_text("CNPJ").unwrap().to_string(),
        model: ide.child_text("mod").unwrap().parse().unwrap(),
        series: ide.child_text("serie").unwrap().parse().unwrap(),
        number: ide.child_text("nBP").unwrap().parse().unwrap(),
        emission_type: ide.child_text("tpEmis").unwrap().parse().unwrap(),
        numeric_code: ide.child_text("cBP").unwrap().parse().unwrap(),
    }
    .derive()
    .unwrap();
    assert_eq!(again, key);
}

#[test]
fn missing_issuer_name_fails() {
    let mut input = input();
    if let Some(emit) = input.emit.as_mut() {
        emit.name = None;
    }
    assert_eq!(
        TicketAssembler::assemble(&input),
        Err(AssemblyError::MissingRequiredField {
            element: "xNome".to_string(),
            context: "emit".to_string(),
        })
    );
}

#[test]
fn unknown_cst_surfaces() {
    let mut input = input();
    if let Some(icms) = input.icms.as_mut() {
        icms.cst = Some("70".to_string());
    }
    assert!(matches!(
        TicketAssembler::assemble(&input),
        Err(AssemblyError::UnknownTaxSituation { .. })
    ));
}

#[test]
fn qr_supplement_on_signed_output() {
    let (xml, key) = TicketAssembler::assemble(&input()).unwrap();
    let signed = xml.replace(
        "</BPe>",
        r#"<Signature xmlns="http://www.w3.org/2000/09/xmldsig#"><SignedInfo/></Signature></BPe>"#,
    );
    let out = put_qr_tag(&signed, bpe_make::DEFAULT_QRCODE_URL).unwrap();
    let doc = XmlDocument::parse(out).unwrap();
    let qr = doc.find("qrCodBPe").unwrap().text().to_string();
    assert!(qr.ends_with(&format!("chBPe={key}&tpAmb=2")));
    let names: Vec<&str> = doc.root().children().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["infBPe", "infBPeSupl", "Signature"]);
}

proptest! {
    /// Whatever check digit and Id the caller supplies, the built document
    /// carries the derived key, and checking it again changes nothing.
    #[test]
    fn self_heal_is_idempotent(cdv in 0u8..=9, id in "[0-9]{0,44}") {
        let mut input = input();
        input.inf_bpe.id = Some(id);
        if let Some(ide) = input.ide.as_mut() {
            ide.check_digit = Some(cdv.to_string());
        }
        let (xml, key) = TicketAssembler::assemble(&input).unwrap();
        prop_assert!(DocumentKey::new(key.as_str()).is_ok());
        let cdv = format!("<cDV>{}</cDV>", key.check_digit());
        prop_assert!(xml.contains(&cdv));

        let mut bpe = bpe_core::Element::new("BPe");
        let mut inf = bpe_core::Element::new("infBPe").with_attr("Id", format!("BPe{key}"));
        let doc = XmlDocument::parse(xml).unwrap();
        let mut ide = bpe_core::Element::new("ide");
        for child in doc.find("ide").unwrap().children() {
            ide.push_text(child.name(), child.text());
        }
        let mut emit = bpe_core::Element::new("emit");
        emit.push_text("CNPJ", doc.find("emit").unwrap().child_text("CNPJ").unwrap());
        inf.push(ide);
        inf.push(emit);
        bpe.push(inf);
        let before = bpe.clone();
        prop_assert_eq!(key_fields(&bpe).unwrap().derive().unwrap(), key.clone());
        prop_assert_eq!(check_key(&mut bpe).unwrap(), key);
        prop_assert_eq!(bpe, before);
    }
}
