//! Decoding of Garoon SOAP responses into plain source records.
//!
//! Elements are matched by local name so the various namespace prefixes Garoon
//! versions emit do not matter.

use anyhow::{Context, Result, bail};
use roxmltree::{Document, Node};

use grnsync_core::source::{Member, RepeatCondition, SourceEvent, SourceSpan};

/// Fault codes ScheduleGetEventsById answers with when the event was deleted
/// or is no longer visible to the login user.
const MISSING_EVENT_CODES: &[&str] = &["GRN_SCHD_13001"];

/// Every `schedule_event` in a ScheduleGetEvents / ScheduleGetEventsById response.
pub fn decode_events(xml: &str) -> Result<Vec<SourceEvent>> {
    let doc = parse(xml)?;
    Ok(events_in(&doc).collect())
}

/// The event of a ScheduleGetEventsById response, or None when Garoon reports
/// it missing. Any other fault is an error.
pub fn decode_event_by_id(xml: &str) -> Result<Option<SourceEvent>> {
    let doc = Document::parse(xml).context("Failed to parse Garoon response")?;

    if let Some(fault) = find_fault(&doc) {
        if text_in(fault, "code").is_some_and(|code| MISSING_EVENT_CODES.contains(&code)) {
            return Ok(None);
        }
        bail!("Garoon returned a fault: {}", describe_fault(fault));
    }

    Ok(events_in(&doc).next())
}

/// The `user_id` of a UtilGetLoginUserId response.
pub fn decode_login_user_id(xml: &str) -> Result<String> {
    let doc = parse(xml)?;

    let user_id = doc
        .descendants()
        .find(|n| is(n, "returns"))
        .and_then(|returns| child(returns, "user_id"))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .context("Response carries no user_id")?;

    Ok(user_id.to_string())
}

fn parse(xml: &str) -> Result<Document<'_>> {
    let doc = Document::parse(xml).context("Failed to parse Garoon response")?;
    if let Some(fault) = find_fault(&doc) {
        bail!("Garoon returned a fault: {}", describe_fault(fault));
    }
    Ok(doc)
}

fn find_fault<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|n| is(n, "Fault"))
}

fn events_in<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = SourceEvent> {
    doc.descendants()
        .filter(|n| is(n, "schedule_event"))
        .map(decode_event)
}

fn text_in<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.descendants()
        .find(|n| is(n, name))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Garoon puts the useful part in `Detail/diagnosis`; plain SOAP servers only
/// fill `Reason/Text` or `faultstring`.
fn describe_fault(fault: Node) -> String {
    let message = text_in(fault, "diagnosis")
        .or_else(|| text_in(fault, "Text"))
        .or_else(|| text_in(fault, "faultstring"))
        .unwrap_or("unknown fault");

    match text_in(fault, "code") {
        Some(code) => format!("{} ({})", message, code),
        None => message.to_string(),
    }
}

fn decode_event(node: Node) -> SourceEvent {
    let attr = |name: &str| node.attribute(name).unwrap_or_default().to_string();

    let description = node
        .attribute("description")
        .map(str::to_string)
        .or_else(|| child(node, "description").and_then(|n| n.text()).map(str::to_string))
        .unwrap_or_default();

    let when = child(node, "when");
    let spans = |kind: &str| -> Vec<SourceSpan> {
        when.map(|w| {
            children(w, kind)
                .map(|n| SourceSpan {
                    start: n.attribute("start").unwrap_or_default().to_string(),
                    end: n.attribute("end").map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
    };

    let members = child(node, "members")
        .map(|members| {
            children(members, "member")
                .filter_map(|member| child(member, "user"))
                .map(|user| Member {
                    id: user.attribute("id").unwrap_or_default().to_string(),
                    name: user.attribute("name").unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let repeat = child(node, "repeat_info")
        .and_then(|info| child(info, "condition"))
        .map(decode_condition);

    SourceEvent {
        id: attr("id"),
        event_type: attr("event_type"),
        plan: attr("plan"),
        detail: attr("detail"),
        description,
        timezone: attr("timezone"),
        end_timezone: node
            .attribute("end_timezone")
            .filter(|z| !z.is_empty())
            .map(str::to_string),
        start_only: node.attribute("start_only") == Some("true"),
        datetimes: spans("datetime"),
        dates: spans("date"),
        members,
        repeat,
    }
}

fn decode_condition(node: Node) -> RepeatCondition {
    let optional = |name: &str| node.attribute(name).map(str::to_string);

    RepeatCondition {
        kind: node.attribute("type").unwrap_or_default().to_string(),
        day: optional("day"),
        week: optional("week"),
        start_date: node.attribute("start_date").unwrap_or_default().to_string(),
        end_date: node.attribute("end_date").unwrap_or_default().to_string(),
        start_time: optional("start_time"),
        end_time: optional("end_time"),
    }
}

fn is(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(n, name))
}

fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| is(n, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope" xmlns:schedule="http://wsdl.cybozu.co.jp/schedule/2008">
  <soap:Body>
    <schedule:ScheduleGetEventsResponse>
      <returns>
        <schedule_event id="1001" event_type="normal" public_type="public" plan="Meeting" detail="Planning" timezone="Asia/Tokyo" end_timezone="Asia/Tokyo" allday="false" start_only="false">
          <description>Room 3</description>
          <members xmlns="http://schemas.cybozu.co.jp/schedule/2008">
            <member order="0"><user id="7" name="Sato" order="0"/></member>
            <member order="1"><user id="8" name="Suzuki" order="1"/></member>
            <member order="2"><facility id="3" name="Room 3" order="0"/></member>
          </members>
          <when xmlns="http://schemas.cybozu.co.jp/schedule/2008">
            <datetime start="2024-03-01T01:00:00Z" end="2024-03-01T02:00:00Z"/>
          </when>
        </schedule_event>
        <schedule_event id="1002" event_type="banner" plan="" detail="Trip" timezone="Asia/Tokyo" start_only="false">
          <members xmlns="http://schemas.cybozu.co.jp/schedule/2008">
            <member order="0"><user id="7" name="Sato" order="0"/></member>
          </members>
          <when xmlns="http://schemas.cybozu.co.jp/schedule/2008">
            <date start="2024-03-01" end="2024-03-03"/>
          </when>
        </schedule_event>
        <schedule_event id="1003" event_type="repeat" plan="" detail="Standup" timezone="Asia/Tokyo" start_only="true">
          <members xmlns="http://schemas.cybozu.co.jp/schedule/2008">
            <member order="0"><user id="7" name="Sato" order="0"/></member>
          </members>
          <repeat_info xmlns="http://schemas.cybozu.co.jp/schedule/2008">
            <condition type="week" day="0" week="3" start_date="2024-01-03" end_date="2024-06-30" start_time="10:00:00" end_time="10:15:00"/>
            <exclusive_datetimes>
              <exclusive_datetime start="2024-02-07T00:00:00+09:00" end="2024-02-08T00:00:00+09:00"/>
            </exclusive_datetimes>
          </repeat_info>
        </schedule_event>
      </returns>
    </schedule:ScheduleGetEventsResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[test]
    fn decodes_timed_event() {
        let events = decode_events(EVENTS).unwrap();
        assert_eq!(events.len(), 3);

        let meeting = &events[0];
        assert_eq!(meeting.id, "1001");
        assert_eq!(meeting.plan, "Meeting");
        assert_eq!(meeting.detail, "Planning");
        assert_eq!(meeting.description, "Room 3");
        assert_eq!(meeting.timezone, "Asia/Tokyo");
        assert_eq!(meeting.end_timezone.as_deref(), Some("Asia/Tokyo"));
        assert!(!meeting.start_only);
        assert_eq!(
            meeting.datetimes,
            vec![SourceSpan::new("2024-03-01T01:00:00Z", Some("2024-03-01T02:00:00Z"))]
        );
        assert!(meeting.dates.is_empty());
        assert!(meeting.repeat.is_none());
    }

    #[test]
    fn members_are_users_only() {
        let events = decode_events(EVENTS).unwrap();
        let ids: Vec<_> = events[0].members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
        assert_eq!(events[0].members[0].name, "Sato");
    }

    #[test]
    fn decodes_date_event() {
        let events = decode_events(EVENTS).unwrap();
        let trip = &events[1];
        assert_eq!(trip.dates, vec![SourceSpan::new("2024-03-01", Some("2024-03-03"))]);
        assert_eq!(trip.end_timezone, None);
        assert_eq!(trip.description, "");
    }

    #[test]
    fn decodes_repeat_condition() {
        let events = decode_events(EVENTS).unwrap();
        let standup = &events[2];
        assert!(standup.start_only);

        let condition = standup.repeat.as_ref().unwrap();
        assert_eq!(condition.kind, "week");
        assert_eq!(condition.week.as_deref(), Some("3"));
        assert_eq!(condition.start_date, "2024-01-03");
        assert_eq!(condition.end_date, "2024-06-30");
        assert_eq!(condition.start_time.as_deref(), Some("10:00:00"));
        assert_eq!(condition.end_time.as_deref(), Some("10:15:00"));
        assert!(standup.datetimes.is_empty());
    }

    #[test]
    fn description_attribute_is_accepted() {
        let xml = r#"<Envelope><Body><returns>
            <schedule_event id="5" detail="x" description="from attr"/>
        </returns></Body></Envelope>"#;
        let events = decode_events(xml).unwrap();
        assert_eq!(events[0].description, "from attr");
    }

    #[test]
    fn empty_result_decodes_to_no_events() {
        let xml = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
            <soap:Body><ScheduleGetEventsByIdResponse><returns/></ScheduleGetEventsByIdResponse></soap:Body>
        </soap:Envelope>"#;
        assert!(decode_events(xml).unwrap().is_empty());
    }

    #[test]
    fn login_user_id() {
        let xml = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
            <soap:Body>
              <util:GetRequestTokenResponse xmlns:util="http://wsdl.cybozu.co.jp/util_api/2008">
                <returns><user_id>7</user_id></returns>
              </util:GetRequestTokenResponse>
            </soap:Body>
        </soap:Envelope>"#;
        assert_eq!(decode_login_user_id(xml).unwrap(), "7");
    }

    #[test]
    fn faults_become_errors() {
        let xml = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
            <soap:Body>
              <soap:Fault>
                <soap:Code><soap:Value>soap:Sender</soap:Value></soap:Code>
                <soap:Reason><soap:Text xml:lang="en">Authentication failed</soap:Text></soap:Reason>
                <soap:Detail>
                  <code>GRN_CMMN_00105</code>
                  <diagnosis>Invalid account or password</diagnosis>
                </soap:Detail>
              </soap:Fault>
            </soap:Body>
        </soap:Envelope>"#;

        let err = decode_events(xml).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Invalid account or password"), "{}", message);
        assert!(message.contains("GRN_CMMN_00105"), "{}", message);
    }

    fn fault(code: &str, diagnosis: &str) -> String {
        format!(
            r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
            <soap:Body>
              <soap:Fault>
                <soap:Code><soap:Value>soap:Sender</soap:Value></soap:Code>
                <soap:Reason><soap:Text xml:lang="en">{diagnosis}</soap:Text></soap:Reason>
                <soap:Detail>
                  <code>{code}</code>
                  <diagnosis>{diagnosis}</diagnosis>
                </soap:Detail>
              </soap:Fault>
            </soap:Body>
        </soap:Envelope>"#
        )
    }

    #[test]
    fn missing_event_fault_is_none() {
        let xml = fault("GRN_SCHD_13001", "The appointment was not found.");
        assert_eq!(decode_event_by_id(&xml).unwrap(), None);

        // Only the by-id lookup treats it as an answer.
        assert!(decode_events(&xml).is_err());
    }

    #[test]
    fn other_faults_on_lookup_stay_errors() {
        let xml = fault("GRN_CMMN_00105", "Invalid account or password");
        let err = decode_event_by_id(&xml).unwrap_err();
        assert!(format!("{:#}", err).contains("GRN_CMMN_00105"));

        assert!(decode_event_by_id("<html>502 Bad Gateway").is_err());
    }

    #[test]
    fn lookup_returns_the_event() {
        let xml = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
          <soap:Body><schedule:ScheduleGetEventsByIdResponse xmlns:schedule="http://wsdl.cybozu.co.jp/schedule/2008">
            <returns>
              <schedule_event id="42" event_type="normal" detail="Review" version="3">
                <when><datetime start="2024-05-01T01:00:00Z" end="2024-05-01T02:00:00Z"/></when>
              </schedule_event>
            </returns>
          </schedule:ScheduleGetEventsByIdResponse></soap:Body>
        </soap:Envelope>"#;

        let event = decode_event_by_id(xml).unwrap().unwrap();
        assert_eq!(event.id, "42");
        assert_eq!(event.detail, "Review");
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_events("<html>502 Bad Gateway").is_err());
        assert!(decode_login_user_id("<Envelope/>").is_err());
    }
}
