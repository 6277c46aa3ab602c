//! # Key Consistency Checker
//!
//! Re-derives the document key from the header fields of an assembled
//! ticket and compares it with the key stored in `infBPe/@Id`. When they
//! differ the derived key wins: `ide/cDV` and `@Id` are rewritten in place.
//! A wrong emission month caused by clock skew, or a stale check digit,
//! therefore never reaches SEFAZ as an inconsistent key.

use bpe_core::constants::{root, KEY_ID_PREFIX};
use bpe_core::{DocumentKey, Element, KeyFields};
use chrono::{DateTime, Datelike, NaiveDateTime};

use crate::error::AssemblyError;

fn field(group: &Element, name: &str) -> Result<String, AssemblyError> {
    group
        .child(name)
        .map(Element::text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AssemblyError::missing(name, group.name()))
}

fn number<T: std::str::FromStr>(group: &Element, name: &str) -> Result<T, AssemblyError> {
    let text = field(group, name)?;
    text.parse()
        .map_err(|_| AssemblyError::invalid(name, format!("not a number: {text:?}")))
}

/// Two-digit year and month of an emission timestamp, in its own offset.
fn year_month(issued_at: &str) -> Result<(u8, u8), AssemblyError> {
    let (year, month) = match DateTime::parse_from_rfc3339(issued_at) {
        Ok(dt) => (dt.year(), dt.month()),
        Err(_) => {
            let naive = NaiveDateTime::parse_from_str(issued_at, "%Y-%m-%dT%H:%M:%S")
                .map_err(|e| AssemblyError::invalid("dhEmi", e.to_string()))?;
            (naive.year(), naive.month())
        }
    };
    Ok(((year.rem_euclid(100)) as u8, month as u8))
}

/// Key fields read from a `BPe` (or bare `infBPe`) element.
pub fn key_fields(bpe: &Element) -> Result<KeyFields, AssemblyError> {
    let inf = inf_bpe(bpe)?;
    let ide = inf
        .child("ide")
        .ok_or_else(|| AssemblyError::missing("ide", root::INF_BPE))?;
    let emit = inf
        .child("emit")
        .ok_or_else(|| AssemblyError::missing("emit", root::INF_BPE))?;
    let (year, month) = year_month(&field(ide, "dhEmi")?)?;
    Ok(KeyFields {
        uf_code: number(ide, "cUF")?,
        year,
        month,
        tax_id: field(emit, "CNPJ")?,
        model: number(ide, "mod")?,
        series: number(ide, "serie")?,
        number: number(ide, "nBP")?,
        emission_type: number(ide, "tpEmis")?,
        numeric_code: number(ide, "cBP")?,
    })
}

fn inf_bpe(bpe: &Element) -> Result<&Element, AssemblyError> {
    if bpe.name() == root::INF_BPE {
        return Ok(bpe);
    }
    bpe.child(root::INF_BPE)
        .ok_or_else(|| AssemblyError::missing(root::INF_BPE, bpe.name()))
}

/// Make the stored key agree with the derived one and return it.
///
/// Running it a second time on its own output changes nothing.
pub fn check_key(bpe: &mut Element) -> Result<DocumentKey, AssemblyError> {
    let derived = key_fields(bpe)?.derive()?;
    let is_root = bpe.name() == root::INF_BPE;
    let inf = if is_root {
        bpe
    } else {
        bpe.child_mut(root::INF_BPE)
            .ok_or_else(|| AssemblyError::missing(root::INF_BPE, root::BPE))?
    };

    let stored = inf
        .attr("Id")
        .map(|id| id.replacen(KEY_ID_PREFIX, "", 1))
        .unwrap_or_default();
    if stored != derived.as_str() {
        tracing::warn!(
            stored = %stored,
            derived = %derived,
            "document key inconsistent with header fields; rewriting Id and cDV"
        );
        inf.set_attr("Id", format!("{KEY_ID_PREFIX}{derived}"));
        let cdv = inf
            .child_mut("ide")
            .and_then(|ide| ide.child_mut("cDV"))
            .ok_or_else(|| AssemblyError::missing("cDV", "ide"))?;
        cdv.set_text(derived.check_digit().to_string());
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(id: &str, cdv: &str, dh_emi: &str) -> Element {
        let mut ide = Element::new("ide");
        for (k, v) in [
            ("cUF", "35"),
            ("tpAmb", "2"),
            ("mod", "63"),
            ("serie", "1"),
            ("nBP", "123"),
            ("cBP", "45678901"),
            ("cDV", cdv),
            ("dhEmi", dh_emi),
            ("tpEmis", "1"),
        ] {
            ide.push_text(k, v);
        }
        let mut emit = Element::new("emit");
        emit.push_text("CNPJ", "12345678000195");
        let mut inf = Element::new("infBPe").with_attr("Id", id).with_attr("versao", "1.00");
        inf.push(ide);
        inf.push(emit);
        let mut bpe = Element::new("BPe");
        bpe.push(inf);
        bpe
    }

    const GOOD: &str = "35190112345678000195630010000001231456789013";

    #[test]
    fn consistent_key_untouched() {
        let mut bpe = ticket(&format!("BPe{GOOD}"), "3", "2019-01-10T10:00:00-03:00");
        let before = bpe.clone();
        let key = check_key(&mut bpe).unwrap();
        assert_eq!(key.as_str(), GOOD);
        assert_eq!(bpe, before);
    }

    #[test]
    fn wrong_check_digit_healed() {
        let wrong = format!("BPe{}0", &GOOD[..43]);
        let mut bpe = ticket(&wrong, "0", "2019-01-10T10:00:00-03:00");
        let key = check_key(&mut bpe).unwrap();
        assert_eq!(key.as_str(), GOOD);
        let inf = bpe.child("infBPe").unwrap();
        assert_eq!(inf.attr("Id"), Some(format!("BPe{GOOD}").as_str()));
        assert_eq!(inf.find("cDV").unwrap().text(), "3");

        let healed = bpe.clone();
        check_key(&mut bpe).unwrap();
        assert_eq!(bpe, healed);
    }

    #[test]
    fn month_comes_from_emission_date() {
        let mut bpe = ticket(&format!("BPe{GOOD}"), "3", "2019-02-01T00:30:00-03:00");
        let key = check_key(&mut bpe).unwrap();
        assert_eq!(key.year_month(), "1902");
        assert_ne!(key.as_str(), GOOD);
    }

    #[test]
    fn empty_id_is_filled() {
        let mut bpe = ticket("BPe", "", "2019-01-10T10:00:00-03:00");
        let key = check_key(&mut bpe).unwrap();
        assert_eq!(key.as_str(), GOOD);
    }

    #[test]
    fn timestamp_without_offset_accepted() {
        assert_eq!(year_month("2020-12-31T23:59:59").unwrap(), (20, 12));
        assert!(year_month("yesterday").is_err());
    }

    #[test]
    fn non_numeric_field_rejected() {
        let mut bpe = ticket("BPe", "", "2019-01-10T10:00:00-03:00");
        if let Some(n) = bpe
            .child_mut("infBPe")
            .and_then(|i| i.child_mut("ide"))
            .and_then(|i| i.child_mut("nBP"))
        {
            n.set_text("12a");
        }
        assert!(matches!(
            check_key(&mut bpe),
            Err(AssemblyError::InvalidField { .. })
        ));
    }
}
