//! Translation tables for console output

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

/// Identifier of every user-facing string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    Header,
    ServiceTitle,
    CountryCode,
    ResponseTime,
    Mismatch,
    FetchFailed,
    FetchTimedOut,
    DnsTitle,
    ResolverIp,
    ResolverCountry,
    DnsToolMissing,
    DnsFailed,
    DnsLocalResolver,
    SummaryTitle,
    GeoipPass,
    GeoipFail,
    DiscrepancyLine,
    DnsPass,
    DnsLeak,
    DnsSkipped,
    DnsLocalSkipped,
    DnsError,
    OverallPass,
    OverallFail,
    PrimaryFailed,
    CheckedAt,
    ProgressServices,
    ProgressDns,
}

impl Message {
    pub const ALL: [Message; 28] = [
        Message::Header,
        Message::ServiceTitle,
        Message::CountryCode,
        Message::ResponseTime,
        Message::Mismatch,
        Message::FetchFailed,
        Message::FetchTimedOut,
        Message::DnsTitle,
        Message::ResolverIp,
        Message::ResolverCountry,
        Message::DnsToolMissing,
        Message::DnsFailed,
        Message::DnsLocalResolver,
        Message::SummaryTitle,
        Message::GeoipPass,
        Message::GeoipFail,
        Message::DiscrepancyLine,
        Message::DnsPass,
        Message::DnsLeak,
        Message::DnsSkipped,
        Message::DnsLocalSkipped,
        Message::DnsError,
        Message::OverallPass,
        Message::OverallFail,
        Message::PrimaryFailed,
        Message::CheckedAt,
        Message::ProgressServices,
        Message::ProgressDns,
    ];
}

const EN: &[(Message, &str)] = &[
    (Message::Header, "=== IP ADDRESS: {ip} | TARGET: {code} ==="),
    (Message::ServiceTitle, "--- GeoIP: {name} ---"),
    (Message::CountryCode, "Country code: {code}"),
    (Message::ResponseTime, "Response time: {ms} ms"),
    (Message::Mismatch, "!!! MISMATCH with primary IP ({code})"),
    (Message::FetchFailed, "Failed to fetch data: {error}"),
    (Message::FetchTimedOut, "Request timed out."),
    (Message::DnsTitle, "--- DNS LEAK CHECK ---"),
    (Message::ResolverIp, "Resolver IP: {ip}"),
    (Message::ResolverCountry, "DNS geolocation: {code}"),
    (Message::DnsToolMissing, "'dig' command not found, DNS check skipped."),
    (Message::DnsFailed, "DNS check failed: {error}"),
    (
        Message::DnsLocalResolver,
        "Resolver {ip} has a local address and cannot be geolocated.",
    ),
    (Message::SummaryTitle, "--- FINAL COMPLIANCE CHECK ---"),
    (
        Message::GeoipPass,
        "GEOIP VERIFIED: {ok} of {total} databases see country {code}.",
    ),
    (
        Message::GeoipFail,
        "GEOIP FAILED: discrepancies or errors found. Successful checks: {ok}/{total}.",
    ),
    (Message::DiscrepancyLine, "  {name} reports {code}"),
    (Message::DnsPass, "DNS VERIFIED: DNS server is located in {code}."),
    (
        Message::DnsLeak,
        "DNS LEAK: GeoIP ({code}) does not match DNS ({dns})!",
    ),
    (Message::DnsSkipped, "DNS CHECK SKIPPED: lookup tool unavailable."),
    (
        Message::DnsLocalSkipped,
        "DNS CHECK SKIPPED: resolver {ip} is on a local network, not a leak.",
    ),
    (Message::DnsError, "DNS CHECK FAILED: resolver could not be geolocated."),
    (Message::OverallPass, "ALL CHECKS PASSED. Access should be open."),
    (
        Message::OverallFail,
        "VPN FAILED THE CHECK! Consider switching servers.",
    ),
    (
        Message::PrimaryFailed,
        "Could not determine the primary IP. Check your internet connection.",
    ),
    (Message::CheckedAt, "Checked at {time}"),
    (Message::ProgressServices, "Querying {count} GeoIP services"),
    (Message::ProgressDns, "Probing DNS resolver"),
];

const RU: &[(Message, &str)] = &[
    (Message::Header, "=== IP АДРЕС: {ip} | ЦЕЛЬ: {code} ==="),
    (Message::ServiceTitle, "--- GeoIP: {name} ---"),
    (Message::CountryCode, "Код страны: {code}"),
    (Message::ResponseTime, "Время ответа: {ms} мс"),
    (Message::Mismatch, "!!! РАСХОЖДЕНИЕ с основным IP ({code})"),
    (Message::FetchFailed, "Ошибка получения данных: {error}"),
    (Message::FetchTimedOut, "Превышено время ожидания."),
    (Message::DnsTitle, "--- ПРОВЕРКА УТЕЧКИ DNS ---"),
    (Message::ResolverIp, "IP резолвера: {ip}"),
    (Message::ResolverCountry, "Геолокация DNS: {code}"),
    (Message::DnsToolMissing, "Команда 'dig' не найдена, проверка DNS пропущена."),
    (Message::DnsFailed, "Проверка DNS завершилась с ошибкой: {error}"),
    (
        Message::DnsLocalResolver,
        "Резолвер {ip} имеет локальный адрес, геолокация невозможна.",
    ),
    (Message::SummaryTitle, "--- ИТОГОВАЯ ПРОВЕРКА СООТВЕТСТВИЯ ---"),
    (
        Message::GeoipPass,
        "GEOIP ВЕРИФИКАЦИЯ: {ok} из {total} баз видят страну {code}.",
    ),
    (
        Message::GeoipFail,
        "GEOIP ПРОВАЛ: обнаружены расхождения или ошибки. Успешных проверок: {ok}/{total}.",
    ),
    (Message::DiscrepancyLine, "  {name} сообщает {code}"),
    (Message::DnsPass, "DNS ВЕРИФИКАЦИЯ: DNS-сервер находится в стране {code}."),
    (
        Message::DnsLeak,
        "DNS LEAK ПРОВАЛ: GeoIP ({code}) не совпадает с DNS ({dns})!",
    ),
    (Message::DnsSkipped, "ПРОВЕРКА DNS ПРОПУЩЕНА: утилита недоступна."),
    (
        Message::DnsLocalSkipped,
        "ПРОВЕРКА DNS ПРОПУЩЕНА: резолвер {ip} в локальной сети, это не утечка.",
    ),
    (Message::DnsError, "ПРОВЕРКА DNS ПРОВАЛЕНА: не удалось определить страну резолвера."),
    (
        Message::OverallPass,
        "СИСТЕМА ПРОШЛА ВСЕ ПРОВЕРКИ. Доступ должен быть открыт.",
    ),
    (
        Message::OverallFail,
        "VPN НЕ ПРОШЕЛ ПРОВЕРКУ! Рекомендуется смена сервера.",
    ),
    (
        Message::PrimaryFailed,
        "Не удалось получить основной IP. Проверьте интернет-соединение.",
    ),
    (Message::CheckedAt, "Проверено {time}"),
    (Message::ProgressServices, "Опрос {count} GeoIP сервисов"),
    (Message::ProgressDns, "Проверка DNS резолвера"),
];

/// Message table for one locale, falling back to English for missing entries
#[derive(Debug, Clone)]
pub struct Catalog {
    locale: Locale,
    entries: HashMap<Message, &'static str>,
}

impl Catalog {
    pub fn new(locale: Locale) -> Self {
        let mut entries: HashMap<Message, &'static str> = EN.iter().copied().collect();
        let overrides: &[(Message, &'static str)] = match locale {
            Locale::En => &[],
            Locale::Ru => RU,
        };
        entries.extend(overrides.iter().copied());

        Self { locale, entries }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Look up `message` and substitute each `{key}` placeholder.
    ///
    /// The template is scanned once, so substituted values are never expanded
    /// again. Placeholders without a matching argument are kept as written.
    pub fn render(&self, message: Message, args: &[(&str, &str)]) -> String {
        let template = self.entries.get(&message).copied().unwrap_or_default();
        let mut text = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                text.push_str(tail);
                rest = "";
                break;
            };

            let key = &tail[1..close];
            match args.iter().find(|(k, _)| *k == key) {
                Some((_, value)) => text.push_str(value),
                None => text.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
        }

        text.push_str(rest);
        text
    }

    pub fn text(&self, message: Message) -> String {
        self.render(message, &[])
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
