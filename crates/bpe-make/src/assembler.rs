//! # Ticket Assembler
//!
//! Builds a `BPe` document one tag group at a time. Each `tag_*` operation
//! turns an input record into a group element and stores it; `build()`
//! composes the stored groups in the order the layout schema requires,
//! whatever order the operations were called in, runs the key consistency
//! check, and serializes.
//!
//! Missing required values do not abort the tag operation: they are
//! recorded and `build()` refuses to compose while any are pending. The
//! exception is an unknown ICMS `CST`, which fails `tag_icms` immediately
//! since no block can be chosen at all.
//!
//! An assembler builds one document. A second `build()` fails with
//! [`AssemblyError::AlreadyBuilt`] until [`TicketAssembler::reset`] is
//! called. A failed `build()` leaves the stored groups in place so the
//! caller can supply what was missing and try again. Assemblers hold no
//! shared state; use one per ticket.

use bpe_core::constants::{limit, root, width, KEY_ID_PREFIX, PORTAL_NAMESPACE};
use bpe_core::key::random_numeric_code;
use bpe_core::strings::{only_numbers, pad_left, sanitize};
use bpe_core::{DocumentKey, Element};

use crate::error::AssemblyError;
use crate::group::{present, Group};
use crate::key_check::check_key;
use crate::records::*;
use crate::tax::{Icms, IcmsRecord};

/// Stateful builder for one ticket document.
#[derive(Debug, Default)]
pub struct TicketAssembler {
    inf_bpe: Option<Element>,
    ide: Option<Element>,
    emit: Option<Element>,
    emit_address: Option<Element>,
    tar: Option<String>,
    buyer: Option<Element>,
    buyer_address: Option<Element>,
    agency: Option<Element>,
    agency_address: Option<Element>,
    substitution: Option<Element>,
    passage: Option<Element>,
    passenger: Option<Element>,
    journey: Option<Element>,
    crossing: Option<Element>,
    value: Option<Element>,
    components: Vec<Element>,
    taxes: Option<Element>,
    icms: Option<Element>,
    payments: Vec<Element>,
    downloaders: Vec<Element>,
    additional: Option<Element>,
    supplement: Option<Element>,
    errors: Vec<AssemblyError>,
    key: Option<DocumentKey>,
    xml: Option<String>,
}

fn address(name: &str, r: &AddressRecord, with_country: bool, errors: &mut Vec<AssemblyError>) -> Element {
    let mut g = Group::new(name, errors);
    g.required("xLgr", r.street.as_deref());
    g.required("nro", r.number.as_deref());
    g.optional("xCpl", r.complement.as_deref());
    g.required("xBairro", r.district.as_deref());
    g.required("cMun", r.city_code.as_deref());
    g.required("xMun", r.city.as_deref());
    g.optional("CEP", r.postal_code.as_deref());
    g.required("UF", r.uf.as_deref());
    if with_country {
        g.required("cPais", r.country_code.as_deref());
        g.required("xPais", r.country.as_deref());
    }
    g.optional("fone", r.phone.as_deref());
    g.optional("email", r.email.as_deref());
    g.finish()
}

impl TicketAssembler {
    /// Empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every tag operation for the groups present in `input`, then
    /// [`build`](Self::build).
    pub fn assemble(input: &TicketInput) -> Result<(String, DocumentKey), AssemblyError> {
        let mut a = Self::new();
        a.tag_inf_bpe(&input.inf_bpe);
        if let Some(r) = &input.ide {
            a.tag_ide(r);
        }
        if let Some(r) = &input.emit {
            a.tag_emit(r);
        }
        if let Some(r) = &input.emit_address {
            a.tag_ender_emit(r);
        }
        if let Some(r) = &input.buyer {
            a.tag_comp(r);
        }
        if let Some(r) = &input.buyer_address {
            a.tag_ender_comp(r);
        }
        if let Some(r) = &input.agency {
            a.tag_agencia(r);
        }
        if let Some(r) = &input.agency_address {
            a.tag_ender_agencia(r);
        }
        if let Some(r) = &input.substitution {
            a.tag_inf_bpe_sub(r);
        }
        if let Some(r) = &input.passage {
            a.tag_inf_passagem(r);
        }
        if let Some(r) = &input.passenger {
            a.tag_inf_passageiro(r);
        }
        if let Some(r) = &input.journey {
            a.tag_inf_viagem(r);
        }
        if let Some(r) = &input.crossing {
            a.tag_inf_travessia(r);
        }
        if let Some(r) = &input.value {
            a.tag_inf_valor_bpe(r);
        }
        for r in &input.components {
            a.tag_inf_valor_bpe_comp(r);
        }
        if let Some(r) = &input.taxes {
            a.tag_imp(r);
        }
        if let Some(r) = &input.icms {
            a.tag_icms(r)?;
        }
        for r in &input.payments {
            a.tag_pag(r);
        }
        for r in &input.downloaders {
            a.tag_aut_xml(r);
        }
        if let Some(r) = &input.additional {
            a.tag_inf_adic(r);
        }
        if let Some(r) = &input.supplement {
            a.tag_inf_bpe_supl(r);
        }
        let xml = a.build()?;
        let key = a
            .key()
            .cloned()
            .ok_or_else(|| AssemblyError::missing("Id", root::INF_BPE))?;
        Ok((xml, key))
    }

    /// `infBPe` with its `Id` and `versao` attributes.
    pub fn tag_inf_bpe(&mut self, r: &InfBpeRecord) {
        let digits = only_numbers(r.id.as_deref().unwrap_or_default());
        let mut el = Element::new(root::INF_BPE).with_attr("Id", format!("{KEY_ID_PREFIX}{digits}"));
        match present(r.version.as_deref()) {
            Some(v) => el.set_attr("versao", v),
            None => self.errors.push(AssemblyError::missing("versao", root::INF_BPE)),
        }
        self.inf_bpe = Some(el);
    }

    /// `ide`. A random `cBP` is generated when none is given.
    pub fn tag_ide(&mut self, r: &IdentificationRecord) {
        let numeric_code = match present(r.numeric_code.as_deref()) {
            Some(code) => pad_left(code, width::NUMERIC_CODE),
            None => {
                let number = present(r.number.as_deref())
                    .and_then(|n| n.parse::<u64>().ok())
                    .unwrap_or_default();
                pad_left(&random_numeric_code(number).to_string(), width::NUMERIC_CODE)
            }
        };
        let reason = r
            .contingency_reason
            .as_deref()
            .map(|j| sanitize(j, limit::CONTINGENCY_JUSTIFICATION));

        let mut g = Group::new("ide", &mut self.errors);
        g.required("cUF", r.uf_code.as_deref());
        g.required("tpAmb", r.environment.as_deref());
        g.required("mod", r.model.as_deref());
        g.required("serie", r.series.as_deref());
        g.required("nBP", r.number.as_deref());
        g.required("cBP", Some(numeric_code.as_str()));
        g.required("cDV", r.check_digit.as_deref());
        g.required("modal", r.modal.as_deref());
        g.required("dhEmi", r.issued_at.as_deref());
        g.required("tpEmis", r.emission_type.as_deref());
        g.required("verProc", r.app_version.as_deref());
        g.required("tpBPe", r.ticket_type.as_deref());
        g.required("indPres", r.presence.as_deref());
        g.required("UFIni", r.origin_uf.as_deref());
        g.required("cMunIni", r.origin_city.as_deref());
        g.required("UFFim", r.destination_uf.as_deref());
        g.required("cMunFim", r.destination_city.as_deref());
        g.optional("dhCont", r.contingency_at.as_deref());
        g.optional("xJust", reason.as_deref());
        self.ide = Some(g.finish());
        tracing::debug!(group = "ide", "tag group stored");
    }

    /// `emit`. `TAR` is held back and written after `enderEmit`.
    pub fn tag_emit(&mut self, r: &IssuerRecord) {
        let ie = r.state_registration.as_deref().map(only_numbers);
        let iest = r.substitute_registration.as_deref().map(only_numbers);

        let mut g = Group::new("emit", &mut self.errors);
        g.required("CNPJ", r.cnpj.as_deref());
        g.required("IE", ie.as_deref());
        g.optional("IEST", iest.as_deref());
        g.required("xNome", r.name.as_deref());
        g.optional("xFant", r.trade_name.as_deref());
        g.required("IM", r.municipal_registration.as_deref());
        g.required("CNAE", r.cnae.as_deref());
        g.required("CRT", r.tax_regime.as_deref());
        self.emit = Some(g.finish());
        self.tar = present(r.tar.as_deref()).map(str::to_string);
    }

    /// `enderEmit`.
    pub fn tag_ender_emit(&mut self, r: &AddressRecord) {
        self.emit_address = Some(address("enderEmit", r, false, &mut self.errors));
    }

    /// `comp`: buyer.
    pub fn tag_comp(&mut self, r: &BuyerRecord) {
        let mut g = Group::new("comp", &mut self.errors);
        g.required("xNome", r.name.as_deref());
        if let Some(cpf) = present(r.cpf.as_deref()) {
            g.required("CPF", Some(cpf));
        } else if let Some(id) = present(r.foreign_id.as_deref()) {
            g.required("idEstrangeiro", Some(id));
        } else {
            g.required("CNPJ", r.cnpj.as_deref());
        }
        g.optional("IE", r.state_registration.as_deref());
        self.buyer = Some(g.finish());
    }

    /// `enderComp`.
    pub fn tag_ender_comp(&mut self, r: &AddressRecord) {
        self.buyer_address = Some(address("enderComp", r, true, &mut self.errors));
    }

    /// `agencia`.
    pub fn tag_agencia(&mut self, r: &AgencyRecord) {
        let mut g = Group::new("agencia", &mut self.errors);
        g.required("xNome", r.name.as_deref());
        g.required("CNPJ", r.cnpj.as_deref());
        self.agency = Some(g.finish());
    }

    /// `enderAgencia`.
    pub fn tag_ender_agencia(&mut self, r: &AddressRecord) {
        self.agency_address = Some(address("enderAgencia", r, true, &mut self.errors));
    }

    /// `infBPeSub`.
    pub fn tag_inf_bpe_sub(&mut self, r: &SubstitutionRecord) {
        let mut g = Group::new("infBPeSub", &mut self.errors);
        g.required("chBPe", r.key.as_deref());
        g.required("tpSub", r.kind.as_deref());
        self.substitution = Some(g.finish());
    }

    /// `infPassagem`.
    pub fn tag_inf_passagem(&mut self, r: &PassageRecord) {
        let mut g = Group::new("infPassagem", &mut self.errors);
        g.required("cLocOrig", r.origin_code.as_deref());
        g.required("xLocOrig", r.origin.as_deref());
        g.required("cLocDest", r.destination_code.as_deref());
        g.required("xLocDest", r.destination.as_deref());
        g.required("dhEmb", r.boarding_at.as_deref());
        g.required("dhValidade", r.valid_until.as_deref());
        self.passage = Some(g.finish());
    }

    /// `infPassageiro`, nested in `infPassagem` at build time.
    pub fn tag_inf_passageiro(&mut self, r: &PassengerRecord) {
        let mut g = Group::new("infPassageiro", &mut self.errors);
        g.required("xNome", r.name.as_deref());
        g.optional("CPF", r.cpf.as_deref());
        if present(r.document_type.as_deref()).is_some() {
            g.required("tpDoc", r.document_type.as_deref());
            g.required("nDoc", r.document_number.as_deref());
            g.optional("xDoc", r.document_description.as_deref());
        }
        g.optional("dNasc", r.birth_date.as_deref());
        g.optional("fone", r.phone.as_deref());
        g.optional("email", r.email.as_deref());
        self.passenger = Some(g.finish());
    }

    /// `infViagem`.
    pub fn tag_inf_viagem(&mut self, r: &JourneyRecord) {
        let mut g = Group::new("infViagem", &mut self.errors);
        g.required("cPercurso", r.route_code.as_deref());
        g.required("xPercurso", r.route.as_deref());
        g.required("tpViagem", r.trip_type.as_deref());
        g.required("tpServ", r.service_type.as_deref());
        g.required("tpAcomodacao", r.accommodation.as_deref());
        g.required("tpTrecho", r.leg_type.as_deref());
        g.required("dhViagem", r.departs_at.as_deref());
        g.optional("dhConexao", r.connection_at.as_deref());
        g.optional("prefixo", r.line_prefix.as_deref());
        g.optional("poltrona", r.seat.as_deref());
        g.optional("plataforma", r.platform.as_deref());
        self.journey = Some(g.finish());
    }

    /// `infTravessia`, nested in `infViagem` at build time.
    pub fn tag_inf_travessia(&mut self, r: &CrossingRecord) {
        let mut g = Group::new("infTravessia", &mut self.errors);
        g.required("tpVeiculo", r.vehicle_type.as_deref());
        g.required("sitVeiculo", r.vehicle_status.as_deref());
        self.crossing = Some(g.finish());
    }

    /// `infValorBPe`.
    pub fn tag_inf_valor_bpe(&mut self, r: &ValueRecord) {
        let mut g = Group::new("infValorBPe", &mut self.errors);
        g.required("vBP", r.ticket.as_deref());
        g.required("vDesconto", r.discount.as_deref());
        g.required("vPgto", r.paid.as_deref());
        g.required("vTroco", r.change.as_deref());
        if present(r.discount_type.as_deref()).is_some() {
            g.required("tpDesconto", r.discount_type.as_deref());
            g.required("xDesconto", r.discount_description.as_deref());
            g.optional("cDesconto", r.discount_code.as_deref());
        }
        self.value = Some(g.finish());
    }

    /// One `Comp` entry, appended to `infValorBPe` at build time.
    pub fn tag_inf_valor_bpe_comp(&mut self, r: &ValueComponentRecord) {
        let mut g = Group::new("Comp", &mut self.errors);
        g.required("tpComp", r.kind.as_deref());
        g.required("vComp", r.value.as_deref());
        self.components.push(g.finish());
    }

    /// `imp` fields other than the ICMS block.
    pub fn tag_imp(&mut self, r: &TaxRecord) {
        let mut g = Group::new("imp", &mut self.errors);
        g.optional("vTotTrib", r.total_taxes.as_deref());
        g.optional("infAdFisco", r.fiscal_info.as_deref());
        self.taxes = Some(g.finish());
    }

    /// ICMS block selected by `CST`.
    ///
    /// # Errors
    ///
    /// [`AssemblyError::UnknownTaxSituation`] for an unknown code; nothing
    /// is stored in that case.
    pub fn tag_icms(&mut self, r: &IcmsRecord) -> Result<(), AssemblyError> {
        let icms = Icms::from_record(r)?;
        self.icms = Some(icms.to_element(&mut self.errors));
        Ok(())
    }

    /// One `pag` entry.
    pub fn tag_pag(&mut self, r: &PaymentRecord) {
        let card = r.card.as_ref().map(|c| {
            let installments = present(c.installments.as_deref()).map(|n| pad_left(n, width::INSTALLMENTS));
            let mut g = Group::new("card", &mut self.errors);
            g.required("tpIntegra", c.integration.as_deref());
            g.optional("CNPJ", c.cnpj.as_deref());
            g.optional("tBand", c.brand.as_deref());
            g.optional("xBand", c.brand_name.as_deref());
            g.optional("cAut", c.authorization.as_deref());
            g.optional("nsuTrans", c.transaction_nsu.as_deref());
            g.optional("nsuHost", c.host_nsu.as_deref());
            g.optional("nParcelas", installments.as_deref());
            g.optional("infAdCard", c.extra.as_deref());
            g.finish()
        });

        let mut g = Group::new("pag", &mut self.errors);
        g.required("tPag", r.method.as_deref());
        g.optional("xPag", r.description.as_deref());
        g.optional("nDocPag", r.document.as_deref());
        g.required("vPag", r.amount.as_deref());
        if let Some(card) = card {
            g.push(card);
        }
        self.payments.push(g.finish());
    }

    /// One `autXML` entry: CNPJ, else CPF.
    pub fn tag_aut_xml(&mut self, r: &DownloaderRecord) {
        let mut g = Group::new("autXML", &mut self.errors);
        if let Some(cnpj) = present(r.cnpj.as_deref()) {
            g.required("CNPJ", Some(cnpj));
        } else if let Some(cpf) = present(r.cpf.as_deref()) {
            g.required("CPF", Some(cpf));
        } else {
            g.record(AssemblyError::missing("CNPJ", "autXML"));
        }
        self.downloaders.push(g.finish());
    }

    /// `infAdic`. Both texts are sanitized and truncated.
    pub fn tag_inf_adic(&mut self, r: &AdditionalInfoRecord) {
        let fiscal = r.fiscal.as_deref().map(|t| sanitize(t, limit::FISCAL_INFO));
        let complementary = r
            .complementary
            .as_deref()
            .map(|t| sanitize(t, limit::COMPLEMENTARY_INFO));
        let mut g = Group::new("infAdic", &mut self.errors);
        g.optional("infAdFisco", fiscal.as_deref());
        g.optional("infCpl", complementary.as_deref());
        let el = g.finish();
        self.additional = (!el.is_empty()).then_some(el);
    }

    /// `infBPeSupl`, written after `infBPe`.
    pub fn tag_inf_bpe_supl(&mut self, r: &SupplementRecord) {
        match present(r.qr_code.as_deref()) {
            Some(url) => {
                let mut el = Element::new(root::INF_BPE_SUPL);
                el.push_cdata("qrCodBPe", url);
                self.supplement = Some(el);
            }
            None => self
                .errors
                .push(AssemblyError::missing("qrCodBPe", root::INF_BPE_SUPL)),
        }
    }

    /// Missing or invalid values recorded so far.
    pub fn errors(&self) -> &[AssemblyError] {
        &self.errors
    }

    /// Canonical key of the last built document.
    pub fn key(&self) -> Option<&DocumentKey> {
        self.key.as_ref()
    }

    /// Last built document.
    pub fn xml(&self) -> Option<&str> {
        self.xml.as_deref()
    }

    /// Forget everything, making the assembler reusable.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Compose the stored groups, fix the key, and serialize.
    ///
    /// # Errors
    ///
    /// The first recorded error, or [`AssemblyError::MissingRequiredField`]
    /// naming the first absent required group.
    pub fn build(&mut self) -> Result<String, AssemblyError> {
        if self.xml.is_some() {
            return Err(AssemblyError::AlreadyBuilt);
        }
        if let Some(first) = self.errors.first() {
            return Err(first.clone());
        }

        let mut inf = self
            .inf_bpe
            .clone()
            .ok_or_else(|| AssemblyError::missing(root::INF_BPE, root::BPE))?;
        inf.push(required(self.ide.clone(), "ide")?);

        let mut emit = required(self.emit.clone(), "emit")?;
        emit.push(
            self.emit_address
                .clone()
                .ok_or_else(|| AssemblyError::missing("enderEmit", "emit"))?,
        );
        if let Some(tar) = self.tar.clone() {
            emit.push_text("TAR", tar);
        }
        inf.push(emit);

        if let Some(mut buyer) = self.buyer.clone() {
            if let Some(addr) = self.buyer_address.clone() {
                buyer.push(addr);
            }
            inf.push(buyer);
        }
        if let Some(mut agency) = self.agency.clone() {
            agency.push(
                self.agency_address
                    .clone()
                    .ok_or_else(|| AssemblyError::missing("enderAgencia", "agencia"))?,
            );
            inf.push(agency);
        }
        if let Some(sub) = self.substitution.clone() {
            inf.push(sub);
        }

        let mut passage = required(self.passage.clone(), "infPassagem")?;
        if let Some(passenger) = self.passenger.clone() {
            passage.push(passenger);
        }
        inf.push(passage);

        let mut journey = required(self.journey.clone(), "infViagem")?;
        if let Some(crossing) = self.crossing.clone() {
            journey.push(crossing);
        }
        inf.push(journey);

        let mut value = required(self.value.clone(), "infValorBPe")?;
        for comp in self.components.iter().cloned() {
            value.push(comp);
        }
        inf.push(value);

        let mut icms = Element::new("ICMS");
        icms.push(
            self.icms
                .clone()
                .ok_or_else(|| AssemblyError::missing("ICMS", "imp"))?,
        );
        let mut imp = Element::new("imp");
        imp.push(icms);
        if let Some(taxes) = self.taxes.clone() {
            for child in taxes.elements() {
                imp.push(child.clone());
            }
        }
        inf.push(imp);

        if self.payments.is_empty() {
            return Err(AssemblyError::missing("pag", root::INF_BPE));
        }
        for pag in self.payments.iter().cloned() {
            inf.push(pag);
        }
        for aut in self.downloaders.iter().cloned() {
            inf.push(aut);
        }
        if let Some(adic) = self.additional.clone() {
            inf.push(adic);
        }

        let mut bpe = Element::new(root::BPE).with_attr("xmlns", PORTAL_NAMESPACE);
        bpe.push(inf);
        if let Some(supl) = self.supplement.clone() {
            bpe.push(supl);
        }

        let key = check_key(&mut bpe)?;
        let xml = bpe.to_document()?;
        tracing::debug!(key = %key, bytes = xml.len(), "ticket document built");
        self.key = Some(key);
        self.xml = Some(xml.clone());
        Ok(xml)
    }
}

fn required(group: Option<Element>, name: &str) -> Result<Element, AssemblyError> {
    group.ok_or_else(|| AssemblyError::missing(name, root::INF_BPE))
}
