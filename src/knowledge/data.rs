//! Compiled-in reference dataset.

use std::collections::BTreeMap;

use crate::models::health::{
    EmergencyContact,
    HealthCategory,
    HealthCondition,
    HealthTip,
    NutritionInfo,
    Severity,
};

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn conditions() -> Vec<HealthCondition> {
    vec![
        HealthCondition {
            id: "fever_common".into(),
            name: "Common Fever".into(),
            category: HealthCategory::FeverIllness,
            symptoms: list(
                &[
                    "Body temperature above 100.4°F (38°C)",
                    "Feeling hot or flushed",
                    "Chills or shivering",
                    "Headache",
                    "Body aches",
                    "Weakness or fatigue",
                ]
            ),
            first_aid_steps: list(
                &[
                    "Rest in a cool, comfortable place",
                    "Drink plenty of fluids - water, ORS, coconut water",
                    "Take paracetamol as per age-appropriate dosage",
                    "Use cold compresses on forehead",
                    "Wear light, loose clothing",
                    "Monitor temperature every 2-4 hours",
                ]
            ),
            when_to_seek_help: list(
                &[
                    "Fever above 103°F (39.4°C)",
                    "Fever lasting more than 3 days",
                    "Difficulty breathing",
                    "Severe headache or neck stiffness",
                    "Persistent vomiting",
                    "Signs of dehydration",
                    "Confusion or drowsiness",
                ]
            ),
            prevention: list(
                &[
                    "Maintain good hygiene",
                    "Wash hands regularly",
                    "Avoid crowded places during illness outbreaks",
                    "Stay hydrated",
                    "Get adequate sleep",
                    "Eat nutritious food",
                ]
            ),
            severity: Severity::Mild,
            age_specific: map(
                &[
                    (
                        "children",
                        "For children under 3 months with fever, seek immediate medical attention",
                    ),
                    (
                        "elderly",
                        "Elderly people may not show high fever even with serious infections",
                    ),
                ]
            ),
            tags: list(&["बुखार", "காய்ச்சல்", "జ్వరం", "temperature"]),
        },
        HealthCondition {
            id: "cough_cold".into(),
            name: "Cough and Cold".into(),
            category: HealthCategory::Respiratory,
            symptoms: list(
                &[
                    "Runny or stuffy nose",
                    "Cough (dry or with phlegm)",
                    "Sneezing",
                    "Mild headache",
                    "Low-grade fever",
                    "Sore throat",
                ]
            ),
            first_aid_steps: list(
                &[
                    "Rest and stay hydrated",
                    "Gargle with warm salt water",
                    "Inhale steam from hot water",
                    "Use honey for cough (not for children under 1 year)",
                    "Take warm liquids like tea, soup",
                    "Use a humidifier or breathe moist air",
                ]
            ),
            when_to_seek_help: list(
                &[
                    "Difficulty breathing",
                    "Persistent high fever",
                    "Chest pain",
                    "Coughing up blood",
                    "Symptoms worsening after a week",
                    "Severe headache with neck stiffness",
                ]
            ),
            prevention: list(
                &[
                    "Wash hands frequently",
                    "Avoid touching face with unwashed hands",
                    "Stay away from sick people",
                    "Cover cough and sneeze",
                    "Maintain good nutrition",
                    "Get adequate rest",
                ]
            ),
            severity: Severity::Mild,
            age_specific: BTreeMap::new(),
            tags: list(&["खांसी", "இருமல்", "దగ్గు", "cold"]),
        },
        HealthCondition {
            id: "diarrhea".into(),
            name: "Diarrhea".into(),
            category: HealthCategory::Digestive,
            symptoms: list(
                &[
                    "Loose, watery stools",
                    "Frequent bowel movements",
                    "Abdominal cramps",
                    "Nausea",
                    "Vomiting",
                    "Fever (sometimes)",
                ]
            ),
            first_aid_steps: list(
                &[
                    "Drink plenty of fluids - ORS solution is best",
                    "BRAT diet: Bananas, Rice, Applesauce, Toast",
                    "Avoid dairy products temporarily",
                    "Take probiotics if available",
                    "Rest and avoid strenuous activity",
                    "Monitor for signs of dehydration",
                ]
            ),
            when_to_seek_help: list(
                &[
                    "Signs of severe dehydration",
                    "Blood in stool",
                    "High fever (above 102°F)",
                    "Severe abdominal pain",
                    "Diarrhea lasting more than 3 days",
                    "Vomiting that prevents keeping fluids down",
                ]
            ),
            prevention: list(
                &[
                    "Drink clean, boiled water",
                    "Eat freshly cooked food",
                    "Wash hands before eating",
                    "Avoid street food",
                    "Store food properly",
                    "Maintain kitchen hygiene",
                ]
            ),
            severity: Severity::Moderate,
            age_specific: map(
                &[
                    (
                        "children",
                        "Children dehydrate quickly - seek help if persistent vomiting or decreased urination",
                    ),
                    ("elderly", "Elderly are at higher risk of dehydration complications"),
                ]
            ),
            tags: list(
                &[
                    "दस्त",
                    "उल्टी",
                    "வயிற்றுப்போக்கு",
                    "வாந்தி",
                    "అతిసారం",
                    "వాంతులు",
                    "loose motion",
                ]
            ),
        },
        HealthCondition {
            id: "minor_cuts".into(),
            name: "Minor Cuts and Wounds".into(),
            category: HealthCategory::InjuriesWounds,
            symptoms: list(
                &[
                    "Bleeding from skin break",
                    "Pain at wound site",
                    "Possible bruising around area",
                ]
            ),
            first_aid_steps: list(
                &[
                    "Wash your hands before treating",
                    "Stop bleeding by applying direct pressure",
                    "Clean wound with clean water",
                    "Apply antiseptic if available",
                    "Cover with clean bandage",
                    "Change bandage daily",
                    "Keep wound dry and clean",
                ]
            ),
            when_to_seek_help: list(
                &[
                    "Deep cut that won't stop bleeding",
                    "Signs of infection (pus, red streaks, fever)",
                    "Unable to clean debris from wound",
                    "Cut from dirty or rusty object",
                    "Not up to date with tetanus vaccination",
                    "Wound not healing after a week",
                ]
            ),
            prevention: list(
                &[
                    "Handle sharp objects carefully",
                    "Keep first aid supplies available",
                    "Maintain clean environment",
                    "Wear protective gear when needed",
                ]
            ),
            severity: Severity::Mild,
            age_specific: BTreeMap::new(),
            tags: list(&["cut", "wound", "चोट", "injury"]),
        },
        HealthCondition {
            id: "pregnancy_care".into(),
            name: "Basic Pregnancy Care".into(),
            category: HealthCategory::MaternalHealth,
            symptoms: list(&["This is preventive care, not symptoms"]),
            first_aid_steps: list(
                &[
                    "Eat nutritious food rich in iron and folic acid",
                    "Take prescribed prenatal vitamins",
                    "Drink plenty of clean water",
                    "Get adequate rest",
                    "Avoid alcohol and smoking",
                    "Exercise as recommended by healthcare provider",
                ]
            ),
            when_to_seek_help: list(
                &[
                    "Severe nausea and vomiting",
                    "Bleeding during pregnancy",
                    "Severe abdominal pain",
                    "Decreased fetal movement",
                    "High blood pressure symptoms",
                    "Signs of infection",
                ]
            ),
            prevention: list(
                &[
                    "Regular prenatal checkups",
                    "Balanced nutrition",
                    "Avoid harmful substances",
                    "Manage stress",
                    "Stay active as advised",
                ]
            ),
            severity: Severity::Moderate,
            age_specific: map(
                &[("adults", "Pregnancy requires regular monitoring and professional care")]
            ),
            tags: list(&["pregnant", "गर्भावस्था", "prenatal"]),
        }
    ]
}

pub fn tips() -> Vec<HealthTip> {
    vec![
        HealthTip {
            id: "hydration_summer".into(),
            title: "Stay Hydrated in Summer".into(),
            description: "Drink at least 8-10 glasses of water daily. Include ORS, coconut water, and buttermilk. Avoid excessive tea, coffee, and sugary drinks.".into(),
            category: HealthCategory::PreventiveCare,
            season: Some("summer".into()),
            target_group: Some("all".into()),
        },
        HealthTip {
            id: "hand_hygiene".into(),
            title: "Proper Hand Washing".into(),
            description: "Wash hands with soap for at least 20 seconds, especially before eating, after using toilet, and after coughing/sneezing.".into(),
            category: HealthCategory::PreventiveCare,
            season: Some("all".into()),
            target_group: Some("all".into()),
        },
        HealthTip {
            id: "child_nutrition".into(),
            title: "Balanced Diet for Children".into(),
            description: "Include variety of foods: cereals, pulses, vegetables, fruits, milk products. Avoid junk food and excessive sweets.".into(),
            category: HealthCategory::ChildHealth,
            season: Some("all".into()),
            target_group: Some("children".into()),
        },
        HealthTip {
            id: "monsoon_water".into(),
            title: "Boil Water During Monsoon".into(),
            description: "Water-borne infections rise in the rainy season. Boil drinking water for at least one minute and keep it covered.".into(),
            category: HealthCategory::PreventiveCare,
            season: Some("monsoon".into()),
            target_group: Some("all".into()),
        }
    ]
}

pub fn nutrition() -> Vec<NutritionInfo> {
    vec![
        NutritionInfo {
            id: "tulsi".into(),
            food_item: "Tulsi (Holy Basil)".into(),
            benefits: list(&["Boosts immunity", "Helps with cough and cold", "Reduces stress"]),
            good_for: list(&["respiratory issues", "fever", "stress"]),
            local_names: map(&[("hindi", "तुलसी"), ("tamil", "துளசி"), ("telugu", "తులసి")]),
            season: "all".into(),
        },
        NutritionInfo {
            id: "ginger".into(),
            food_item: "Ginger".into(),
            benefits: list(&["Reduces nausea", "Anti-inflammatory", "Aids digestion"]),
            good_for: list(&["nausea", "indigestion", "cold"]),
            local_names: map(&[("hindi", "अदरक"), ("tamil", "இஞ்சி"), ("telugu", "అల్లం")]),
            season: "all".into(),
        }
    ]
}

pub fn emergency_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact {
            id: "ambulance".into(),
            contact_type: "ambulance".into(),
            number: "108".into(),
            description: "National Emergency Ambulance Service".into(),
            availability: "24/7".into(),
        },
        EmergencyContact {
            id: "health_helpline".into(),
            contact_type: "helpline".into(),
            number: "104".into(),
            description: "National Health Helpline".into(),
            availability: "24/7".into(),
        }
    ]
}
