use crate::models::health::{ EmergencyContact, HealthCondition, HealthTip };

pub const ADVICE_DISCLAIMER: &str =
    "⚠️ यह चिकित्सा सलाह नहीं है। गंभीर स्थिति में तुरंत डॉक्टर से मिलें।\n⚠️ This is not medical advice. Consult a doctor immediately for serious conditions.\n\n";

fn push_numbered(out: &mut String, heading: &str, items: &[String]) {
    out.push_str(heading);
    out.push('\n');
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", index + 1, item));
    }
}

/// Bilingual advisory for a knowledge-base match. The escalation section is
/// present only for moderate and severe conditions.
pub fn format_health_advice(condition: &HealthCondition) -> String {
    let mut advice = String::from(ADVICE_DISCLAIMER);
    advice.push_str(&format!("{} के बारे में जानकारी:\n\n", condition.name));

    push_numbered(&mut advice, "🔍 लक्षण (Symptoms):", &condition.symptoms);
    advice.push('\n');
    push_numbered(&mut advice, "🚑 प्राथमिक उपचार (First Aid):", &condition.first_aid_steps);

    if condition.severity.lists_escalation() {
        advice.push('\n');
        push_numbered(
            &mut advice,
            "🏥 डॉक्टर से कब मिलें (When to seek help):",
            &condition.when_to_seek_help
        );
    }

    advice.push('\n');
    push_numbered(&mut advice, "🛡️ बचाव (Prevention):", &condition.prevention);

    advice
}

pub fn format_emergency_contacts(contacts: &[EmergencyContact]) -> String {
    let mut text = String::from("🚨 आपातकालीन संपर्क (Emergency Contacts):\n");
    for contact in contacts {
        text.push_str(
            &format!("📞 {} - {} ({})\n", contact.number, contact.description, contact.availability)
        );
    }
    text
}

pub fn format_daily_tip(tip: &HealthTip) -> String {
    format!("💡 आज का स्वास्थ्य सुझाव (Today's Health Tip): {}\n\n{}", tip.title, tip.description)
}
