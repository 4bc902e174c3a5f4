//! Static content served when no provider can answer.
//!
//! Everything here is deterministic: the same request always yields the same
//! placeholder text, suggestions and template.

use serde_json::{json, Value};

use crate::{ContentGeneration, FieldSuggestion, GenerateTemplateRequest, RfxType};

pub const UNAVAILABLE_NOTICE: &str =
    "AI servisi geçici olarak kullanılamıyor. Manuel içerik giriniz.";
pub const IMPROVE_UNAVAILABLE_NOTICE: &str =
    "İçerik iyileştirme servisi geçici olarak kullanılamıyor";

/// Placeholder content for a field.
pub fn content_for(field_label: &str, rfx_type: RfxType) -> ContentGeneration {
    let content = match field_label {
        "Şirket Bilgileri" => format!(
            "[Şirket adınızı], [sektör] sektöründe faaliyet gösteren, [çalışan sayısı] çalışanı ile \
             hizmet veren bir kuruluştur. Bu {rfx_type} talebi ile [proje amacı] hedeflenmektedir."
        ),
        "Proje Bağlamı ve Hedefler" => format!(
            "Bu {rfx_type} talebinin amacı [iş ihtiyacı] ihtiyacını karşılamaktır. Proje sonucunda \
             [beklenen çıktılar] elde edilmesi beklenmektedir."
        ),
        "Teknik Özellikler" => "Talep edilen ürün/hizmet aşağıdaki özellikleri sağlamalıdır:\n\
             - [Teknik özellik 1]\n- [Teknik özellik 2]\n- [Performans kriteri]"
            .to_string(),
        "Fiyatlandırma" => "Teklif fiyatınız aşağıdaki kalemleri içermelidir:\n- Birim fiyat\n\
             - Toplam maliyet\n- Ek hizmet ücretleri (varsa)"
            .to_string(),
        "Teslimat Süresi" => "Ürün/hizmet teslimat süresi [X] gün/hafta/ay olarak \
             planlanmaktadır. Teslimat lokasyonu: [Adres]"
            .to_string(),
        other => format!("[{other} için içerik giriniz]"),
    };
    ContentGeneration::new(content, 0.0, vec![UNAVAILABLE_NOTICE.to_string()])
}

/// The original content, unchanged.
pub fn improved_content(current_content: &str) -> ContentGeneration {
    ContentGeneration::new(
        current_content,
        0.0,
        vec![IMPROVE_UNAVAILABLE_NOTICE.to_string()],
    )
}

fn suggestion(label: &str, description: &str, is_required: bool, reasoning: &str) -> FieldSuggestion {
    FieldSuggestion {
        label: label.to_string(),
        description: description.to_string(),
        is_required,
        reasoning: Some(reasoning.to_string()),
    }
}

/// Default field suggestions for a section.
pub fn field_suggestions(section_title: &str) -> Vec<FieldSuggestion> {
    match section_title {
        "Teknik ve Fonksiyonel Gereksinimler" => vec![
            suggestion(
                "Performans Kriterleri",
                "Sistemin sağlaması gereken minimum performans değerleri",
                true,
                "Objektif değerlendirme için gerekli",
            ),
            suggestion(
                "Entegrasyon Gereksinimleri",
                "Mevcut sistemlerle entegrasyon detayları",
                false,
                "Sistem uyumluluğu için önemli",
            ),
        ],
        "Ticari ve Mali Teklif" => vec![
            suggestion(
                "Garanti Koşulları",
                "Ürün/hizmet garanti süresi ve kapsamı",
                true,
                "Satın alma güvencesi için gerekli",
            ),
            suggestion(
                "Ödeme Vadeleri",
                "Ödeme planı ve vade detayları",
                true,
                "Finansal planlama için kritik",
            ),
        ],
        _ => vec![suggestion(
            "Ek Gereksinimler",
            "Bu bölüm için özel gereksinimler",
            false,
            "Kapsamlı bilgi toplama için",
        )],
    }
}

/// Tips attached to successfully generated content.
pub fn field_tips(field_label: &str) -> Vec<String> {
    let tips: &[&str] = match field_label {
        "Teknik Özellikler" => &[
            "Minimum performans kriterleri belirtin",
            "Uyumluluk standartlarını ekleyin",
            "Test ve doğrulama yöntemlerini açıklayın",
        ],
        "Teslimat Koşulları" => &[
            "Teslimat lokasyonlarını netleştirin",
            "Paketleme gereksinimlerini belirtin",
            "Kısmi teslimat opsiyonlarını değerlendirin",
        ],
        "Fiyatlandırma" => &[
            "Birim fiyatları detaylandırın",
            "İndirim koşullarını açıklayın",
            "Ödeme vadelerini belirtin",
        ],
        _ => &[
            "Daha fazla detay ekleyin",
            "Spesifik gereksinimler belirtin",
            "Ölçülebilir kriterler tanımlayın",
        ],
    };
    tips.iter().map(|s| s.to_string()).collect()
}

/// Tips attached to successfully improved content.
pub fn improvement_tips() -> Vec<String> {
    [
        "Daha spesifik teknik detaylar ekleyin",
        "Teslimat koşullarını netleştirin",
        "Kalite kriterlerini belirtin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn section(title: &str, fields: &[(&str, bool)]) -> Value {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(label, required)| json!({ "label": label, "isRequired": required }))
        .collect();
    json!({ "title": title, "fields": fields })
}

/// The default four-section template.
pub fn template(req: &GenerateTemplateRequest) -> Value {
    json!({
        "name": format!("Varsayılan {} Şablonu", req.rfx_type),
        "description": format!("{} için varsayılan şablon - {}", req.rfx_type, req.category),
        "sections": [
            section("Temel Bilgiler", &[
                ("Doküman Başlığı", true),
                ("RFX Türü", true),
                ("Doküman Numarası", true),
            ]),
            section("Proje Özeti", &[
                ("Proje Tanımı", true),
                ("Hedef ve Amaç", true),
                ("Beklenen Çıktılar", false),
            ]),
            section("Teknik Gereksinimler", &[
                ("Teknik Özellikler", true),
                ("Performans Kriterleri", false),
                ("Kalite Standartları", false),
            ]),
            section("Ticari Şartlar", &[
                ("Fiyatlandırma", true),
                ("Ödeme Koşulları", true),
                ("Teslimat Koşulları", true),
            ]),
        ],
    })
}
