use mongodb::bson::oid::ObjectId;

/// 新文档主键：ObjectId 的 24 位十六进制形式
pub fn build_id() -> String {
    ObjectId::new().to_hex()
}

/// 去掉首尾空白，空串视为 None
pub fn trim_to_option(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// 按印度数字分组格式化金额（1,00,000）
pub fn format_inr(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last3) = digits.split_at(digits.len() - 3);
        let mut parts: Vec<String> = vec![];
        let mut rest = head;
        while rest.len() > 2 {
            let (h, t) = rest.split_at(rest.len() - 2);
            parts.push(t.to_string());
            rest = h;
        }
        if !rest.is_empty() {
            parts.push(rest.to_string());
        }
        parts.reverse();
        format!("{},{}", parts.join(","), last3)
    };
    if negative { format!("-{}", grouped) } else { grouped }
}

/// 数字展示：整数不带小数，非整数保留两位
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 { format_inr(value) } else { format!("{:.2}", value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_id_is_object_id_hex() {
        let id = build_id();
        assert_eq!(id.len(), 24);
        assert!(ObjectId::parse_str(&id).is_ok());
    }

    #[test]
    fn trim_to_option_drops_blank() {
        assert_eq!(trim_to_option(Some("  ".into())), None);
        assert_eq!(trim_to_option(Some(" Pune ".into())), Some("Pune".into()));
        assert_eq!(trim_to_option(None), None);
    }

    #[test]
    fn inr_grouping() {
        assert_eq!(format_inr(0.0), "0");
        assert_eq!(format_inr(999.0), "999");
        assert_eq!(format_inr(1000.0), "1,000");
        assert_eq!(format_inr(100000.0), "1,00,000");
        assert_eq!(format_inr(12345678.0), "1,23,45,678");
        assert_eq!(format_inr(-50000.0), "-50,000");
    }

    #[test]
    fn number_keeps_fraction() {
        assert_eq!(format_number(2.5), "2.50");
        assert_eq!(format_number(1500.0), "1,500");
    }
}
