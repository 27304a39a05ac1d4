use crate::data::custom::CustomValue;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Nano 3S style: the blob sits under this key inside one `STATS` array entry.
const MM_ID0: &str = "MM ID0";
/// Avalon Q style: the blob sits under this key, with `Key:[value]` brackets.
const MM_ID0_SUMMARY: &str = "MM ID0:Summary";

static FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\[([^\]]+)\]").expect("Failed to compile regex"));
static STRICT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+):\[([^\]]+)\]").expect("Failed to compile regex"));

/// Flattens the custom data blob of an `estats` response into named fields.
///
/// Returns an empty map when neither known layout is present.
pub fn parse_custom_data(estats: &Value) -> HashMap<String, CustomValue> {
    match find_blob(estats) {
        Some(blob) => parse_fields(&blob),
        None => HashMap::new(),
    }
}

fn find_blob(estats: &Value) -> Option<String> {
    let stats = estats.get("STATS")?;

    if let Some(entries) = stats.as_array() {
        if let Some(blob) = entries
            .iter()
            .filter_map(|entry| entry.get(MM_ID0).and_then(|v| v.as_str()))
            .find(|blob| !blob.is_empty())
        {
            return Some(blob.to_string());
        }

        // newer stock firmware nests the summary form inside the array as well
        return entries
            .iter()
            .find_map(|entry| entry.get(MM_ID0_SUMMARY).and_then(|v| v.as_str()))
            .map(normalize_summary);
    }

    stats
        .get(MM_ID0_SUMMARY)
        .and_then(|v| v.as_str())
        .map(normalize_summary)
}

/// Rewrites `Key:[value]` pairs to the common `Key[value]` form.
fn normalize_summary(blob: &str) -> String {
    STRICT_FIELD.replace_all(blob, "$1[$2]").into_owned()
}

fn parse_fields(blob: &str) -> HashMap<String, CustomValue> {
    FIELD
        .captures_iter(blob)
        .map(|cap| (cap[1].to_string(), CustomValue::parse(&cap[2])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NANO3S_ESTATS: &str = r#"{
        "STATUS":[{"STATUS":"S","When":1730000000,"Code":70,"Msg":"CGMiner stats","Description":"cgminer 4.11.1"}],
        "STATS":[
            {"STATS":0,"ID":"AVALON0","Elapsed":5400,"Calls":0,"Wait":0.0,"Max":0.0,"Min":99999999.0,
             "MM ID0":"Ver[Nano3s-25021401_56abae7] LVer[25021401_56abae7] Elapsed[5400] MemFree[1374240] PING[0] WORKMODE[1] SoftOFF[0] TAvg[62] TMax[71] MPO[140] GHSspd[6123.45] GHSavg[6050.12] Freq[486.82]",
             "MM Count":1,"Nonce Mask":25},
            {"STATS":1,"ID":"POOL0","Elapsed":5400}
        ],
        "id":1
    }"#;

    const AVALON_Q_ESTATS: &str = r#"{
        "STATUS":[{"STATUS":"S","Msg":"CGMiner stats"}],
        "STATS":{
            "MM ID0:Summary":"Ver:[Q-25052801_14a19a2] Elapsed:[90000] WORKMODE:[2] SoftOFF:[1] TMax:[80.5] MPO:[1674] GHSspd:[90210.5] GHSavg:[89950]"
        },
        "id":1
    }"#;

    #[test]
    fn extracts_typed_fields_from_blob() {
        let fields = parse_fields("WORKMODE[1]MPO[850.5]SoftOFF[0]");

        assert_eq!(fields.len(), 3);
        assert_eq!(fields["WORKMODE"], CustomValue::Integer(1));
        assert_eq!(fields["MPO"], CustomValue::Decimal(850.5));
        assert_eq!(fields["SoftOFF"], CustomValue::Integer(0));
    }

    #[test]
    fn parses_nano3s_array_layout() {
        let estats: Value = serde_json::from_str(NANO3S_ESTATS).unwrap();
        let fields = parse_custom_data(&estats);

        assert_eq!(
            fields["Ver"],
            CustomValue::Text("Nano3s-25021401_56abae7".into())
        );
        assert_eq!(fields["Elapsed"], CustomValue::Integer(5400));
        assert_eq!(fields["TMax"], CustomValue::Integer(71));
        assert_eq!(fields["GHSspd"], CustomValue::Decimal(6123.45));
        assert_eq!(fields["Freq"], CustomValue::Decimal(486.82));
    }

    #[test]
    fn parses_avalon_q_summary_layout() {
        let estats: Value = serde_json::from_str(AVALON_Q_ESTATS).unwrap();
        let fields = parse_custom_data(&estats);

        assert_eq!(fields["Elapsed"], CustomValue::Integer(90000));
        assert_eq!(fields["WORKMODE"], CustomValue::Integer(2));
        assert_eq!(fields["SoftOFF"], CustomValue::Integer(1));
        assert_eq!(fields["TMax"], CustomValue::Decimal(80.5));
        assert_eq!(fields["GHSavg"], CustomValue::Integer(89950));
    }

    #[test]
    fn summary_key_inside_array_is_found() {
        let estats = json!({
            "STATS": [{"ID": "AVALON0", "MM ID0:Summary": "Elapsed:[60] MPO:[90]"}]
        });
        let fields = parse_custom_data(&estats);

        assert_eq!(fields["Elapsed"], CustomValue::Integer(60));
        assert_eq!(fields["MPO"], CustomValue::Integer(90));
    }

    #[test]
    fn first_non_empty_module_wins() {
        let estats = json!({
            "STATS": [
                {"MM ID0": ""},
                {"MM ID0": "MPO[100]"},
                {"MM ID0": "MPO[200]"}
            ]
        });
        assert_eq!(parse_custom_data(&estats)["MPO"], CustomValue::Integer(100));
    }

    #[test]
    fn unknown_layouts_yield_nothing() {
        for estats in [
            json!({}),
            json!({"STATUS": [{"STATUS": "S"}]}),
            json!({"STATS": [{"ID": "AVALON0", "Elapsed": 10}]}),
            json!({"STATS": {"Something": "MPO[10]"}}),
            json!({"STATS": [{"MM ID0": 12}]}),
            json!({"STATS": "MPO[10]"}),
        ] {
            assert!(parse_custom_data(&estats).is_empty(), "{estats}");
        }
    }

    #[test]
    fn ignores_unmatched_text_and_empty_values() {
        let fields = parse_fields("garbage MPO[] TMax[70] [5] Fan1[3000]");

        assert_eq!(fields.len(), 2);
        assert_eq!(fields["TMax"], CustomValue::Integer(70));
        assert_eq!(fields["Fan1"], CustomValue::Integer(3000));
    }
}
